#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the rangefinder pipeline.
//!
//! `Config` and its sub-structs are deserialized from TOML and validated.
//! Every section has serde defaults, so a missing file or a partial file
//! degrades to the built-in defaults.
use serde::Deserialize;

/// Event device and privileged access settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceCfg {
    /// Input event device streamed by `getevent -l`.
    pub event_path: String,
    /// Sysfs file toggling the proximity sensor (write 1/0).
    pub enable_path: String,
    /// Axis token identifying relevant event lines.
    pub axis_marker: String,
    /// Run the privileged reader and switch through `su -c`.
    pub use_su: bool,
    /// Per-poll wait for the next line (ms); bounds cancellation latency.
    pub read_timeout_ms: u64,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            event_path: "/dev/input/event11".to_string(),
            enable_path: "/sys/class/input/input11/enable_ps_sensor".to_string(),
            axis_marker: "ABS_HAT1X".to_string(),
            use_su: true,
            read_timeout_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Moving-average window over raw distances (samples).
    pub smoothing_window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            smoothing_window: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StabilityCfg {
    /// Consecutive identical status codes required before a new status is
    /// accepted.
    pub threshold: u32,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self { threshold: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchdogCfg {
    /// Staleness check interval (ms).
    pub poll_ms: u64,
    /// Silence longer than this forces the no-signal reading (ms).
    pub stale_after_ms: u64,
}

impl Default for WatchdogCfg {
    fn default() -> Self {
        Self {
            poll_ms: 200,
            stale_after_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    /// Path to a .log file (JSON lines); stderr only when absent.
    pub file: Option<String>,
    /// "info", "debug", ...
    pub level: Option<String>,
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceCfg,
    pub filter: FilterCfg,
    pub stability: StabilityCfg,
    pub watchdog: WatchdogCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if self.device.event_path.is_empty() {
            eyre::bail!("device.event_path must not be empty");
        }
        if self.device.enable_path.is_empty() {
            eyre::bail!("device.enable_path must not be empty");
        }
        if self.device.axis_marker.trim().is_empty() {
            eyre::bail!("device.axis_marker must not be empty");
        }
        if self.device.read_timeout_ms == 0 {
            eyre::bail!("device.read_timeout_ms must be >= 1");
        }

        // Filter
        if self.filter.smoothing_window == 0 {
            eyre::bail!("filter.smoothing_window must be >= 1");
        }
        if self.filter.smoothing_window > 4096 {
            eyre::bail!("filter.smoothing_window is unreasonably large (>4096)");
        }

        // Stability
        if self.stability.threshold == 0 {
            eyre::bail!("stability.threshold must be >= 1");
        }
        if self.stability.threshold > 1000 {
            eyre::bail!("stability.threshold is unreasonably large (>1000)");
        }

        // Watchdog
        if self.watchdog.poll_ms == 0 {
            eyre::bail!("watchdog.poll_ms must be >= 1");
        }
        if self.watchdog.stale_after_ms < self.watchdog.poll_ms {
            eyre::bail!("watchdog.stale_after_ms must be >= watchdog.poll_ms");
        }

        // Logging
        if let Some(rot) = &self.logging.rotation
            && !matches!(rot.as_str(), "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of: never, daily, hourly");
        }

        Ok(())
    }
}
