//! `From` implementations bridging `ranger_config` types to `ranger_core`
//! types, so the CLI never maps fields by hand.

use crate::pipeline::PipelineCfg;
use crate::session::SessionCfg;
use crate::watchdog::WatchdogCfg;

// ── PipelineCfg ──────────────────────────────────────────────────────────────

impl From<&ranger_config::Config> for PipelineCfg {
    fn from(c: &ranger_config::Config) -> Self {
        Self {
            axis_marker: c.device.axis_marker.clone(),
            smoothing_window: c.filter.smoothing_window,
            stability_threshold: c.stability.threshold,
        }
    }
}

// ── WatchdogCfg ──────────────────────────────────────────────────────────────

impl From<&ranger_config::WatchdogCfg> for WatchdogCfg {
    fn from(c: &ranger_config::WatchdogCfg) -> Self {
        Self {
            poll_ms: c.poll_ms,
            stale_after_ms: c.stale_after_ms,
        }
    }
}

// ── SessionCfg ───────────────────────────────────────────────────────────────

impl From<&ranger_config::Config> for SessionCfg {
    fn from(c: &ranger_config::Config) -> Self {
        Self {
            pipeline: c.into(),
            watchdog: (&c.watchdog).into(),
            source_poll_ms: c.device.read_timeout_ms,
        }
    }
}
