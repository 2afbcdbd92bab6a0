//! Pipeline output unit.

/// Status delivered with the terminal reading when the line source fails.
/// Stable status codes from the device are always in `0..=65535`.
pub const STATUS_SOURCE_FAILURE: i32 = -1;

/// One stabilized, smoothed output of the pipeline.
///
/// `at_ms` is monotonic milliseconds since the session epoch. A distance of
/// 0.0 is the no-signal sentinel; whether it came from the device or from
/// the staleness watchdog is not distinguished at this level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub distance_mm: f64,
    pub status: i32,
    pub at_ms: u64,
}

impl Reading {
    /// Terminal reading emitted once when the line source fails.
    pub fn source_failure(at_ms: u64) -> Self {
        Self {
            distance_mm: 0.0,
            status: STATUS_SOURCE_FAILURE,
            at_ms,
        }
    }

    /// Synthetic no-signal reading; the last accepted status is preserved.
    pub fn signal_lost(status: i32, at_ms: u64) -> Self {
        Self {
            distance_mm: 0.0,
            status,
            at_ms,
        }
    }
}
