#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core rangefinder pipeline (hardware-agnostic).
//!
//! This crate turns an ordered stream of raw input-event text lines into a
//! smoothed, debounced stream of `(distance_mm, status)` readings. All
//! privileged interactions go through `ranger_traits::LineSource` and
//! `ranger_traits::SensorSwitch`.
//!
//! ## Architecture
//!
//! - **Decoding**: marker match + packed hex split (`decode` module)
//! - **Filtering**: moving-average smoothing, status debounce (`filter`)
//! - **Pipeline**: decode → smooth → stabilize per line (`pipeline`)
//! - **Staleness**: per-session watchdog forcing the no-signal reading
//!   (`watchdog`)
//! - **Orchestration**: one scan session with guaranteed sensor shutdown
//!   (`session`)
//! - **Derived metrics**: measurement log with area/volume (`log`)
//!
//! Readings cross threads through a single-slot latest-value channel
//! (`latest`); the producer never blocks on a slow consumer.

// Module declarations
pub mod conversions;
pub mod decode;
pub mod error;
pub mod filter;
pub mod latest;
pub mod log;
pub mod mocks;
pub mod pipeline;
pub mod reading;
pub mod session;
pub mod watchdog;

pub use decode::{DecodedSample, LineDecoder};
pub use error::{BuildError, RangerError};
pub use filter::{SmoothingFilter, StabilityFilter};
pub use log::MeasurementLog;
pub use pipeline::{PipelineCfg, SensorPipeline, SessionShared};
pub use reading::{Reading, STATUS_SOURCE_FAILURE};
pub use session::{ScanSession, SessionBuilder, SessionCfg, SessionStats};
pub use watchdog::{Watchdog, WatchdogCfg};
