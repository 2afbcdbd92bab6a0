pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::time::Duration;

/// One poll of a line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A full line of text, in arrival order.
    Line(String),
    /// Nothing arrived within the timeout; the stream is still open.
    Idle,
    /// The stream ended normally.
    Eof,
}

/// Ordered text-line stream from the sensor's event device.
///
/// `poll_line` must return within roughly `timeout` even when the device is
/// quiet, so callers can observe cancellation between lines.
pub trait LineSource {
    fn poll_line(
        &mut self,
        timeout: Duration,
    ) -> Result<SourceEvent, Box<dyn std::error::Error + Send + Sync>>;
}

/// Privileged on/off control for the physical sensor.
pub trait SensorSwitch {
    fn enable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Consumer of pipeline readings. Runs on the forwarder context, never on
/// the producer; a negative status is the source-failure sentinel.
pub trait ReadingSink {
    fn deliver(&mut self, distance_mm: f64, status: i32);
}

impl<T: LineSource + ?Sized> LineSource for Box<T> {
    fn poll_line(
        &mut self,
        timeout: Duration,
    ) -> Result<SourceEvent, Box<dyn std::error::Error + Send + Sync>> {
        (**self).poll_line(timeout)
    }
}

impl<T: SensorSwitch + ?Sized> SensorSwitch for Box<T> {
    fn enable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).enable()
    }
    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).disable()
    }
}

impl<T: ReadingSink + ?Sized> ReadingSink for Box<T> {
    fn deliver(&mut self, distance_mm: f64, status: i32) {
        (**self).deliver(distance_mm, status)
    }
}
