//! Per-line decode → smooth → stabilize pipeline.

use crate::decode::LineDecoder;
use crate::filter::{SmoothingFilter, StabilityFilter};
use crate::latest::Publisher;
use crate::reading::Reading;
use ranger_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::time::Instant;

/// Pipeline tuning. Defaults match the proximity-sensor stream this was
/// built for: a 10-sample distance window and a 5-sample status debounce.
#[derive(Debug, Clone)]
pub struct PipelineCfg {
    /// Axis token identifying relevant lines.
    pub axis_marker: String,
    /// Moving-average window over raw distances (samples).
    pub smoothing_window: usize,
    /// Consecutive identical status codes required to accept a new status.
    pub stability_threshold: u32,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            axis_marker: "ABS_HAT1X".to_string(),
            smoothing_window: 10,
            stability_threshold: 5,
        }
    }
}

/// State shared between the producer and the watchdog: the session epoch
/// and a (status, timestamp) snapshot of the last real reading.
///
/// Each atomic has exactly one writer (the pipeline) and one reader (the
/// watchdog), so Relaxed ordering is sufficient; the status is stored
/// before the timestamp so a fresh timestamp never pairs with a staler
/// status.
#[derive(Debug)]
pub struct SessionShared {
    epoch: Instant,
    last_reading_ms: AtomicU64,
    last_status: AtomicI32,
}

impl SessionShared {
    /// Sentinel meaning "no reading received yet this session". Kept
    /// distinct from a real reading at ms 0 so the watchdog stays inert
    /// until data actually exists.
    pub const NO_READING: u64 = u64::MAX;

    pub fn new(epoch: Instant) -> Self {
        Self {
            epoch,
            last_reading_ms: AtomicU64::new(Self::NO_READING),
            last_status: AtomicI32::new(0),
        }
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Record a real reading's status and timestamp.
    pub fn record(&self, status: i32, at_ms: u64) {
        self.last_status.store(status, Ordering::Relaxed);
        self.last_reading_ms.store(at_ms, Ordering::Relaxed);
    }

    /// Timestamp of the last real reading, or `None` before the first one.
    pub fn last_reading_ms(&self) -> Option<u64> {
        let v = self.last_reading_ms.load(Ordering::Relaxed);
        (v != Self::NO_READING).then_some(v)
    }

    pub fn last_status(&self) -> i32 {
        self.last_status.load(Ordering::Relaxed)
    }
}

/// One scan session's pipeline. Construct a fresh instance per session:
/// smoothing and stability state must never leak across stop/start cycles,
/// or stale history would bias the first readings of the next session.
pub struct SensorPipeline {
    decoder: LineDecoder,
    smoothing: SmoothingFilter,
    stability: StabilityFilter,
    publisher: Publisher,
    shared: Arc<SessionShared>,
    clock: Arc<dyn Clock + Send + Sync>,
    readings: u64,
    last: Option<Reading>,
}

impl SensorPipeline {
    pub fn new(
        cfg: &PipelineCfg,
        publisher: Publisher,
        shared: Arc<SessionShared>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            decoder: LineDecoder::new(cfg.axis_marker.clone()),
            smoothing: SmoothingFilter::new(cfg.smoothing_window),
            stability: StabilityFilter::new(cfg.stability_threshold),
            publisher,
            shared,
            clock,
            readings: 0,
            last: None,
        }
    }

    /// Process one raw line. Irrelevant and malformed lines have no effect;
    /// a decoded sample produces exactly one published `Reading`, which is
    /// also returned for callers that drive the pipeline directly.
    pub fn on_line(&mut self, line: &str) -> Option<Reading> {
        let sample = self.decoder.decode(line)?;
        tracing::debug!(
            raw_mm = sample.distance_mm,
            raw_status = sample.status,
            "sample decoded"
        );

        let distance_mm = self.smoothing.push(sample.distance_mm);
        let status = i32::from(self.stability.push(sample.status));
        let at_ms = self.clock.ms_since(self.shared.epoch());

        let reading = Reading {
            distance_mm,
            status,
            at_ms,
        };
        self.shared.record(status, at_ms);
        self.publisher.publish(reading);
        self.readings += 1;
        self.last = Some(reading);
        Some(reading)
    }

    /// Monotonic milliseconds since the session epoch.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.shared.epoch())
    }

    /// Number of readings produced so far this session.
    pub fn readings(&self) -> u64 {
        self.readings
    }

    pub fn last_reading(&self) -> Option<Reading> {
        self.last
    }
}

impl core::fmt::Debug for SensorPipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SensorPipeline")
            .field("readings", &self.readings)
            .field("last", &self.last)
            .finish()
    }
}
