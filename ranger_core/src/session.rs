//! Scan session orchestration.
//!
//! One session = sensor on → read/decode loop + watchdog + sink forwarder →
//! sensor off. The sensor-off side effect is tied to a drop guard so it
//! runs exactly once on every exit path: EOF, cancellation, and source
//! failure alike.

use crate::error::{BuildError, RangerError, Result};
use crate::latest;
use crate::pipeline::{PipelineCfg, SensorPipeline, SessionShared};
use crate::reading::Reading;
use crate::watchdog::{Watchdog, WatchdogCfg};
use eyre::WrapErr;
use ranger_traits::clock::{Clock, MonotonicClock};
use ranger_traits::{LineSource, ReadingSink, SensorSwitch, SourceEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Session tuning: pipeline + watchdog parameters and the source poll
/// timeout that bounds how quickly cancellation is observed.
#[derive(Debug, Clone, Default)]
pub struct SessionCfg {
    pub pipeline: PipelineCfg,
    pub watchdog: WatchdogCfg,
    pub source_poll_ms: u64,
}

/// Summary of a finished session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Raw lines seen, relevant or not.
    pub lines: u64,
    /// Readings produced (one per decoded sample).
    pub readings: u64,
    /// The final reading, if any sample decoded.
    pub last: Option<Reading>,
}

/// Builder for a `ScanSession`. All fields are validated on `build()`.
#[derive(Default)]
pub struct SessionBuilder {
    source: Option<Box<dyn LineSource + Send>>,
    switch: Option<Box<dyn SensorSwitch + Send>>,
    sink: Option<Box<dyn ReadingSink + Send>>,
    cfg: SessionCfg,
}

impl SessionBuilder {
    pub fn with_source(mut self, source: impl LineSource + Send + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_switch(mut self, switch: impl SensorSwitch + Send + 'static) -> Self {
        self.switch = Some(Box::new(switch));
        self
    }

    pub fn with_sink(mut self, sink: impl ReadingSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_pipeline_cfg(mut self, cfg: PipelineCfg) -> Self {
        self.cfg.pipeline = cfg;
        self
    }

    pub fn with_watchdog_cfg(mut self, cfg: WatchdogCfg) -> Self {
        self.cfg.watchdog = cfg;
        self
    }

    pub fn with_source_poll_ms(mut self, ms: u64) -> Self {
        self.cfg.source_poll_ms = ms;
        self
    }

    pub fn with_cfg(mut self, cfg: SessionCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn build(self) -> Result<ScanSession> {
        let source = self
            .source
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSource))?;
        let switch = self
            .switch
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSwitch))?;
        let sink = self
            .sink
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSink))?;

        let mut cfg = self.cfg;
        if cfg.source_poll_ms == 0 {
            cfg.source_poll_ms = 50;
        }
        if cfg.pipeline.axis_marker.trim().is_empty() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "axis_marker must not be empty",
            )));
        }
        if cfg.pipeline.smoothing_window == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "smoothing_window must be >= 1",
            )));
        }
        if cfg.pipeline.stability_threshold == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "stability_threshold must be >= 1",
            )));
        }
        if cfg.watchdog.poll_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "watchdog poll_ms must be >= 1",
            )));
        }
        if cfg.watchdog.stale_after_ms < cfg.watchdog.poll_ms {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "watchdog stale_after_ms must be >= poll_ms",
            )));
        }

        Ok(ScanSession {
            source,
            switch,
            sink,
            cfg,
        })
    }
}

/// One scan session, consumed by `run`. Filter state lives inside and dies
/// with the session, so restarting a scan always starts clean.
pub struct ScanSession {
    source: Box<dyn LineSource + Send>,
    switch: Box<dyn SensorSwitch + Send>,
    sink: Box<dyn ReadingSink + Send>,
    cfg: SessionCfg,
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession").field("cfg", &self.cfg).finish_non_exhaustive()
    }
}

impl ScanSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Drive the session until EOF, source failure, or `cancel` goes true.
    ///
    /// On source failure a terminal `Reading(0, -1)` is delivered to the
    /// sink before shutdown. The sensor is disabled exactly once on every
    /// path.
    pub fn run(self, cancel: Arc<AtomicBool>) -> Result<SessionStats> {
        let ScanSession {
            mut source,
            switch,
            sink,
            cfg,
        } = self;

        let mut guard = SensorOffGuard::new(switch);
        guard.enable()?;

        let clock = MonotonicClock::new();
        let shared = Arc::new(SessionShared::new(clock.now()));
        let (publisher, subscriber) = latest::slot();

        let forwarder = std::thread::spawn(move || {
            let mut sink = sink;
            while let Some(r) = subscriber.recv() {
                sink.deliver(r.distance_mm, r.status);
            }
            tracing::trace!("sink forwarder exiting cleanly");
        });

        let watchdog = Watchdog::spawn(&cfg.watchdog, shared.clone(), publisher.clone(), clock);
        let mut pipeline = SensorPipeline::new(
            &cfg.pipeline,
            publisher.clone(),
            shared,
            Arc::new(clock),
        );

        tracing::info!(marker = %cfg.pipeline.axis_marker, "scan session started");

        let poll = Duration::from_millis(cfg.source_poll_ms);
        let mut lines: u64 = 0;
        let mut source_err: Option<RangerError> = None;
        loop {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!("scan session cancelled");
                break;
            }
            match source.poll_line(poll) {
                Ok(SourceEvent::Line(line)) => {
                    lines += 1;
                    pipeline.on_line(&line);
                }
                Ok(SourceEvent::Idle) => continue,
                Ok(SourceEvent::Eof) => {
                    tracing::info!("line source ended");
                    break;
                }
                Err(e) => {
                    let mapped = map_source_error(&*e);
                    tracing::error!(error = %mapped, "line source failed");
                    publisher.publish(Reading::source_failure(pipeline.now_ms()));
                    source_err = Some(mapped);
                    break;
                }
            }
        }

        let stats = SessionStats {
            lines,
            readings: pipeline.readings(),
            last: pipeline.last_reading(),
        };
        tracing::info!(
            lines = stats.lines,
            readings = stats.readings,
            "scan session finished"
        );

        // Teardown order matters: the watchdog holds a publisher clone, so
        // it must go first; once every publisher is gone the forwarder
        // drains the slot and disconnects.
        drop(watchdog);
        drop(pipeline);
        drop(publisher);
        if let Err(e) = forwarder.join() {
            tracing::warn!(?e, "sink forwarder panicked during shutdown");
        }
        drop(guard);

        match source_err {
            Some(e) => Err(eyre::Report::new(e)).wrap_err("scan session aborted"),
            None => Ok(stats),
        }
    }
}

/// Turns the sensor off exactly once when dropped, provided it was turned
/// on. Idempotent across the normal, cancelled, and failed exit paths.
struct SensorOffGuard {
    switch: Box<dyn SensorSwitch + Send>,
    armed: bool,
}

impl SensorOffGuard {
    fn new(switch: Box<dyn SensorSwitch + Send>) -> Self {
        Self {
            switch,
            armed: false,
        }
    }

    fn enable(&mut self) -> Result<()> {
        self.switch
            .enable()
            .map_err(|e| eyre::Report::new(RangerError::Power(e.to_string())))
            .wrap_err("enabling sensor")?;
        self.armed = true;
        Ok(())
    }
}

impl Drop for SensorOffGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        if let Err(e) = self.switch.disable() {
            tracing::warn!(error = %e, "sensor disable failed during cleanup");
        } else {
            tracing::debug!("sensor disabled");
        }
    }
}

// Map a boxed source error to a typed RangerError, with special handling
// for hardware errors when the crate is built with `hardware-errors`.
fn map_source_error(e: &(dyn std::error::Error + 'static)) -> RangerError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<ranger_hardware::HwError>() {
        return match hw {
            ranger_hardware::HwError::Disconnected => {
                RangerError::Source("event stream disconnected".to_string())
            }
            other => RangerError::Source(other.to_string()),
        };
    }
    RangerError::Source(e.to_string())
}
