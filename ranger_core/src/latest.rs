//! Single-slot latest-reading hand-off between producer and consumer.
//!
//! Built on a bounded(1) crossbeam channel. The channel is mpmc, so the
//! publisher keeps a receiver clone purely to evict the stale reading when
//! the slot is full; `publish` therefore never blocks, whatever the
//! consumer is doing. A consumer that falls behind sees only the most
//! recent reading — older ones are superseded, not queued.

use crate::reading::Reading;
use crossbeam_channel as xch;
use std::time::Duration;

/// Create a connected publisher/subscriber pair.
pub fn slot() -> (Publisher, Subscriber) {
    let (tx, rx) = xch::bounded(1);
    let publisher = Publisher {
        evict: rx.clone(),
        tx,
    };
    (publisher, Subscriber { rx })
}

/// Producer side. Clones share the same slot (the watchdog holds one).
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: xch::Sender<Reading>,
    evict: xch::Receiver<Reading>,
}

impl Publisher {
    /// Place `reading` in the slot, displacing a stale occupant. Never
    /// blocks; delivery is dropped silently once the subscriber is gone.
    pub fn publish(&self, reading: Reading) {
        match self.tx.try_send(reading) {
            Ok(()) => {}
            Err(xch::TrySendError::Full(r)) => {
                let _ = self.evict.try_recv();
                // A concurrent publisher may have refilled the slot; its
                // reading is at least as fresh, so losing this one is fine.
                let _ = self.tx.try_send(r);
            }
            Err(xch::TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Consumer side.
#[derive(Debug)]
pub struct Subscriber {
    rx: xch::Receiver<Reading>,
}

impl Subscriber {
    /// Block until a reading arrives; `None` once all publishers are gone
    /// and the slot is drained.
    pub fn recv(&self) -> Option<Reading> {
        self.rx.recv().ok()
    }

    /// Like `recv` with an upper bound; `None` on timeout or disconnect.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Reading> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain the slot and return the most recent reading, if any.
    pub fn latest(&self) -> Option<Reading> {
        self.rx.try_iter().last()
    }
}
