//! Line-source and sensor-switch implementations.
//!
//! The simulator is always available and is the default backend for the
//! CLI; the privileged evdev backend (`getevent` child process + sysfs
//! power file) lives behind the `device` feature.

pub mod error;
pub use error::HwError;

#[cfg(feature = "device")]
pub mod evdev;
#[cfg(feature = "device")]
pub use evdev::{DeviceEventSource, SysfsSwitch};

use ranger_traits::{LineSource, SensorSwitch, SourceEvent};
use std::time::Duration;

/// Deterministic stand-in for the proximity sensor stream.
///
/// Emits one line roughly every `period`; distances sweep a triangle wave
/// between `min_mm` and `max_mm`, every 7th line is an unrelated sync
/// report, and every 11th sample carries the poor-signal status code.
pub struct SimulatedRangeSource {
    mm: u16,
    rising: bool,
    tick: u64,
    period: Duration,
    min_mm: u16,
    max_mm: u16,
    step_mm: u16,
}

impl Default for SimulatedRangeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRangeSource {
    pub fn new() -> Self {
        Self {
            mm: 1200,
            rising: true,
            tick: 0,
            period: Duration::from_millis(4),
            min_mm: 300,
            max_mm: 2000,
            step_mm: 5,
        }
    }

    /// Override the emission period (mainly for tests).
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    fn advance(&mut self) -> u16 {
        if self.rising {
            self.mm = self.mm.saturating_add(self.step_mm);
            if self.mm >= self.max_mm {
                self.rising = false;
            }
        } else {
            self.mm = self.mm.saturating_sub(self.step_mm);
            if self.mm <= self.min_mm {
                self.rising = true;
            }
        }
        self.mm
    }
}

impl LineSource for SimulatedRangeSource {
    fn poll_line(
        &mut self,
        timeout: Duration,
    ) -> Result<SourceEvent, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(self.period.min(timeout));
        self.tick += 1;

        if self.tick % 7 == 0 {
            return Ok(SourceEvent::Line(
                "EV_SYN       SYN_REPORT           00000000".to_string(),
            ));
        }

        let mm = self.advance();
        let status: u16 = if self.tick % 11 == 0 { 12 } else { 0 };
        let packed = (u32::from(mm) << 16) | u32::from(status);
        Ok(SourceEvent::Line(format!(
            "EV_ABS       ABS_HAT1X            {packed:08x}"
        )))
    }
}

/// Sensor switch that only logs; pairs with the simulator.
#[derive(Debug, Default)]
pub struct SimulatedSwitch {
    on: bool,
}

impl SimulatedSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl SensorSwitch for SimulatedSwitch {
    fn enable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.on = true;
        tracing::info!("sensor enabled (simulated)");
        Ok(())
    }

    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.on = false;
        tracing::info!("sensor disabled (simulated)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_switch_tracks_state() {
        let mut sw = SimulatedSwitch::new();
        assert!(!sw.is_on());
        sw.enable().unwrap();
        assert!(sw.is_on());
        sw.disable().unwrap();
        assert!(!sw.is_on());
    }
}
