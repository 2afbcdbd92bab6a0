//! Watchdog thread behavior: inert before data, forcing the no-signal
//! reading after silence, prompt shutdown on drop.

use ranger_core::latest;
use ranger_core::pipeline::SessionShared;
use ranger_core::watchdog::{Watchdog, WatchdogCfg};
use ranger_traits::clock::{Clock, MonotonicClock};
use std::sync::Arc;
use std::time::Duration;

fn fast_cfg() -> WatchdogCfg {
    WatchdogCfg {
        poll_ms: 20,
        stale_after_ms: 40,
    }
}

#[test]
fn inert_before_the_first_reading() {
    let clock = MonotonicClock::new();
    let shared = Arc::new(SessionShared::new(clock.now()));
    let (publisher, subscriber) = latest::slot();

    let watchdog = Watchdog::spawn(&fast_cfg(), shared, publisher, clock);
    // Well past the staleness threshold with zero readings delivered.
    std::thread::sleep(Duration::from_millis(150));
    assert!(
        subscriber.latest().is_none(),
        "watchdog must not fire before any reading exists"
    );
    drop(watchdog);
}

#[test]
fn forces_no_signal_after_silence_preserving_status() {
    let clock = MonotonicClock::new();
    let shared = Arc::new(SessionShared::new(clock.now()));
    let (publisher, subscriber) = latest::slot();

    // One real reading, status 7, then nothing.
    shared.record(7, clock.ms_since(shared.epoch()));

    let watchdog = Watchdog::spawn(&fast_cfg(), shared, publisher, clock);
    std::thread::sleep(Duration::from_millis(150));

    let forced = subscriber
        .latest()
        .expect("watchdog must force a reading after silence");
    assert_eq!(forced.distance_mm, 0.0);
    assert_eq!(forced.status, 7, "status code must pass through unchanged");
    drop(watchdog);
}

#[test]
fn fresh_readings_hold_the_watchdog_off() {
    let clock = MonotonicClock::new();
    let shared = Arc::new(SessionShared::new(clock.now()));
    let (publisher, subscriber) = latest::slot();

    let watchdog = Watchdog::spawn(&fast_cfg(), shared.clone(), publisher, clock);
    // Keep refreshing the timestamp faster than the staleness threshold.
    for _ in 0..10 {
        shared.record(1, clock.ms_since(shared.epoch()));
        std::thread::sleep(Duration::from_millis(15));
    }
    assert!(
        subscriber.latest().is_none(),
        "a live stream must never be forced stale"
    );
    drop(watchdog);
}

#[test]
fn drop_stops_the_thread_promptly() {
    let clock = MonotonicClock::new();
    let shared = Arc::new(SessionShared::new(clock.now()));
    let (publisher, _subscriber) = latest::slot();

    let watchdog = Watchdog::spawn(&fast_cfg(), shared, publisher, clock);
    std::thread::sleep(Duration::from_millis(50));

    let start = std::time::Instant::now();
    drop(watchdog);
    // Worst case: one poll interval of sleep plus join overhead.
    assert!(
        start.elapsed() < Duration::from_millis(500),
        "watchdog shutdown took {:?}",
        start.elapsed()
    );
}
