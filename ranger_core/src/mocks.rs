//! Test and helper doubles for ranger_core.

use ranger_traits::{LineSource, ReadingSink, SensorSwitch, SourceEvent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays a fixed list of lines, then reports EOF. Ignores the timeout.
pub struct ScriptedLineSource {
    lines: VecDeque<String>,
}

impl ScriptedLineSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for ScriptedLineSource {
    fn poll_line(
        &mut self,
        _timeout: Duration,
    ) -> Result<SourceEvent, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self.lines.pop_front() {
            Some(line) => SourceEvent::Line(line),
            None => SourceEvent::Eof,
        })
    }
}

/// Replays a fixed list of lines, then fails with the given message.
pub struct FailingLineSource {
    lines: VecDeque<String>,
    message: &'static str,
}

impl FailingLineSource {
    pub fn new<I, S>(lines: I, message: &'static str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            message,
        }
    }
}

impl LineSource for FailingLineSource {
    fn poll_line(
        &mut self,
        _timeout: Duration,
    ) -> Result<SourceEvent, Box<dyn std::error::Error + Send + Sync>> {
        match self.lines.pop_front() {
            Some(line) => Ok(SourceEvent::Line(line)),
            None => Err(self.message.into()),
        }
    }
}

/// A source that never produces anything; useful for cancellation tests.
pub struct QuietLineSource;

impl LineSource for QuietLineSource {
    fn poll_line(
        &mut self,
        timeout: Duration,
    ) -> Result<SourceEvent, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(timeout.min(Duration::from_millis(5)));
        Ok(SourceEvent::Idle)
    }
}

/// Switch that accepts everything and records nothing.
pub struct NoopSwitch;

impl SensorSwitch for NoopSwitch {
    fn enable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Switch whose enable/disable counts remain observable after the session
/// consumes it.
pub struct SharedSwitch {
    enables: Arc<AtomicU32>,
    disables: Arc<AtomicU32>,
}

impl SharedSwitch {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, Arc<AtomicU32>, Arc<AtomicU32>) {
        let enables = Arc::new(AtomicU32::new(0));
        let disables = Arc::new(AtomicU32::new(0));
        (
            Self {
                enables: enables.clone(),
                disables: disables.clone(),
            },
            enables,
            disables,
        )
    }
}

impl SensorSwitch for SharedSwitch {
    fn enable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.enables.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.disables.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Sink that appends every delivery to a shared vector.
pub struct RecordingSink {
    deliveries: Arc<Mutex<Vec<(f64, i32)>>>,
}

impl RecordingSink {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, Arc<Mutex<Vec<(f64, i32)>>>) {
        let deliveries = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                deliveries: deliveries.clone(),
            },
            deliveries,
        )
    }
}

impl ReadingSink for RecordingSink {
    fn deliver(&mut self, distance_mm: f64, status: i32) {
        if let Ok(mut v) = self.deliveries.lock() {
            v.push((distance_mm, status));
        }
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl ReadingSink for NullSink {
    fn deliver(&mut self, _distance_mm: f64, _status: i32) {}
}
