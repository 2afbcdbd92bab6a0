//! Pipeline-level behavior over raw event lines.

use ranger_core::latest::{self, Subscriber};
use ranger_core::pipeline::{PipelineCfg, SensorPipeline, SessionShared};
use ranger_traits::clock::{Clock, MonotonicClock};
use std::sync::Arc;

fn pipeline_with_slot(cfg: PipelineCfg) -> (SensorPipeline, Subscriber) {
    let clock = MonotonicClock::new();
    let shared = Arc::new(SessionShared::new(clock.now()));
    let (publisher, subscriber) = latest::slot();
    let pipeline = SensorPipeline::new(&cfg, publisher, shared, Arc::new(clock));
    (pipeline, subscriber)
}

fn line_for(mm: u16, status: u16) -> String {
    let packed = (u32::from(mm) << 16) | u32::from(status);
    format!("EV_ABS       ABS_HAT1X            {packed:08x}")
}

#[test]
fn five_identical_lines_promote_the_status() {
    let (mut pipeline, _sub) = pipeline_with_slot(PipelineCfg::default());
    let line = line_for(100, 1);
    for n in 1..=5u32 {
        let r = pipeline.on_line(&line).expect("matching line decodes");
        assert_eq!(r.distance_mm, 100.0);
        if n < 5 {
            assert_eq!(r.status, 0, "status must lag until the run completes");
        } else {
            assert_eq!(r.status, 1, "5th consecutive sample promotes the status");
        }
    }
    assert_eq!(pipeline.readings(), 5);
}

#[test]
fn smoothing_follows_the_recent_window() {
    let (mut pipeline, _sub) = pipeline_with_slot(PipelineCfg {
        smoothing_window: 3,
        ..PipelineCfg::default()
    });
    assert_eq!(pipeline.on_line(&line_for(10, 0)).unwrap().distance_mm, 10.0);
    assert_eq!(pipeline.on_line(&line_for(20, 0)).unwrap().distance_mm, 15.0);
    assert_eq!(pipeline.on_line(&line_for(30, 0)).unwrap().distance_mm, 20.0);
    // 10 evicted: (20 + 30 + 40) / 3
    assert_eq!(pipeline.on_line(&line_for(40, 0)).unwrap().distance_mm, 30.0);
}

#[test]
fn irrelevant_and_malformed_lines_have_no_effect() {
    let (mut pipeline, sub) = pipeline_with_slot(PipelineCfg::default());
    for line in [
        "EV_SYN       SYN_REPORT           00000000",
        "EV_ABS       ABS_HAT0Y            00640001",
        "EV_ABS       ABS_HAT1X            not_hex!",
        "add device 1: /dev/input/event11",
        "",
    ] {
        assert!(pipeline.on_line(line).is_none(), "line must be skipped: {line:?}");
    }
    assert_eq!(pipeline.readings(), 0);
    assert!(sub.latest().is_none(), "nothing may be published");
    assert!(pipeline.last_reading().is_none());
}

#[test]
fn garbage_between_samples_does_not_break_the_stream() {
    let (mut pipeline, _sub) = pipeline_with_slot(PipelineCfg::default());
    for _ in 0..2 {
        pipeline.on_line(&line_for(100, 1));
        assert!(pipeline.on_line("EV_ABS ABS_HAT1X zz").is_none());
        assert!(pipeline.on_line("EV_SYN SYN_REPORT 0").is_none());
    }
    // garbage neither decodes nor disturbs filter state
    assert_eq!(pipeline.readings(), 2);
    let r = pipeline.on_line(&line_for(100, 1)).unwrap();
    assert_eq!(r.distance_mm, 100.0);
}

#[test]
fn published_readings_land_in_the_slot_latest_wins() {
    let (mut pipeline, sub) = pipeline_with_slot(PipelineCfg::default());
    pipeline.on_line(&line_for(10, 0));
    pipeline.on_line(&line_for(20, 0));
    let last = pipeline.on_line(&line_for(30, 0)).unwrap();
    // nothing was consumed in between, so only the newest survives
    assert_eq!(sub.latest(), Some(last));
}

#[test]
fn whitespace_shape_does_not_matter() {
    let (mut pipeline, _sub) = pipeline_with_slot(PipelineCfg::default());
    let r = pipeline
        .on_line("  EV_ABS \t ABS_HAT1X \t 00640001  ")
        .expect("loosely spaced line decodes");
    assert_eq!(r.distance_mm, 100.0);
}

#[test]
fn shared_snapshot_tracks_the_last_reading() {
    let clock = MonotonicClock::new();
    let shared = Arc::new(SessionShared::new(clock.now()));
    let (publisher, _sub) = latest::slot();
    let mut pipeline = SensorPipeline::new(
        &PipelineCfg {
            stability_threshold: 1,
            ..PipelineCfg::default()
        },
        publisher,
        shared.clone(),
        Arc::new(clock),
    );

    assert_eq!(shared.last_reading_ms(), None, "no reading yet");
    pipeline.on_line(&line_for(50, 12));
    assert!(shared.last_reading_ms().is_some());
    assert_eq!(shared.last_status(), 12);
}
