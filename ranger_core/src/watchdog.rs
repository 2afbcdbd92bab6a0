//! Session staleness watchdog.
//!
//! Runs as an independent thread beside the producer, sharing only the
//! `SessionShared` snapshot. When readings stop arriving while a session is
//! active, the absence itself is data: the sensor is occluded or out of
//! range, and the externally observed distance must fall to the no-signal
//! sentinel without touching the status code.
//!
//! Safety: each `Watchdog` owns exactly one thread that is signalled and
//! joined on drop, so a session never leaks its watchdog.

use crate::latest::Publisher;
use crate::pipeline::SessionShared;
use crate::reading::Reading;
use ranger_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
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

/// True when the last reading is older than the staleness threshold.
#[inline]
pub fn is_stale(last_ms: u64, now_ms: u64, stale_after_ms: u64) -> bool {
    now_ms.saturating_sub(last_ms) > stale_after_ms
}

pub struct Watchdog {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Watchdog {
    /// Spawn the watchdog thread for one session. It publishes synthetic
    /// no-signal readings through `publisher` while the stream is stale,
    /// and stays inert until the first real reading has been recorded.
    pub fn spawn<C: Clock + Send + Sync + 'static>(
        cfg: &WatchdogCfg,
        shared: Arc<SessionShared>,
        publisher: Publisher,
        clock: C,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();
        let poll = Duration::from_millis(cfg.poll_ms.max(1));
        let stale_after_ms = cfg.stale_after_ms;

        let join_handle = std::thread::spawn(move || {
            loop {
                clock.sleep(poll);
                if shutdown_flag.load(Ordering::Relaxed) {
                    break;
                }
                // Inert until the first reading: a slow sensor start must
                // not masquerade as signal loss.
                let Some(last_ms) = shared.last_reading_ms() else {
                    continue;
                };
                let now_ms = clock.ms_since(shared.epoch());
                if is_stale(last_ms, now_ms, stale_after_ms) {
                    let status = shared.last_status();
                    tracing::debug!(
                        silent_ms = now_ms.saturating_sub(last_ms),
                        status,
                        "stream stale, forcing no-signal reading"
                    );
                    publisher.publish(Reading::signal_lost(status, now_ms));
                }
            }
            tracing::trace!("watchdog thread exiting cleanly");
        });

        Self {
            shutdown,
            join_handle: Some(join_handle),
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Worst case the thread is mid-sleep, so the join waits at most one
        // poll interval.
        if let Some(handle) = self.join_handle.take()
            && let Err(e) = handle.join()
        {
            tracing::warn!(?e, "watchdog thread panicked during shutdown");
        }
    }
}
