//! Command drivers: hardware assembly, sinks, and the scan/measure/
//! self-check flows.

use ranger_core::{MeasurementLog, ScanSession, SessionCfg, SessionStats};
use ranger_traits::{LineSource, ReadingSink, SensorSwitch};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Advisory label for status codes with a known meaning; unknown codes
/// (including the undocumented 5) are shown verbatim by the caller.
pub fn status_label(status: i32) -> Option<&'static str> {
    match status {
        2 => Some("signal fail"),
        4 => Some("phase fail"),
        5 => Some("hardware/range fail"),
        7 => Some("wrapper fail"),
        12 => Some("poor signal"),
        _ => None,
    }
}

// Choose hardware or simulation
#[cfg(feature = "device")]
fn build_hardware(
    cfg: &ranger_config::Config,
) -> eyre::Result<(Box<dyn LineSource + Send>, Box<dyn SensorSwitch + Send>)> {
    use eyre::WrapErr;
    let source = ranger_hardware::DeviceEventSource::open(&cfg.device.event_path, cfg.device.use_su)
        .wrap_err("opening event device")?;
    let switch =
        ranger_hardware::SysfsSwitch::new(cfg.device.enable_path.clone(), cfg.device.use_su);
    Ok((Box::new(source), Box::new(switch)))
}

#[cfg(not(feature = "device"))]
fn build_hardware(
    cfg: &ranger_config::Config,
) -> eyre::Result<(Box<dyn LineSource + Send>, Box<dyn SensorSwitch + Send>)> {
    let _ = cfg;
    tracing::info!("no device backend compiled in; using simulated sensor");
    Ok((
        Box::new(ranger_hardware::SimulatedRangeSource::new()),
        Box::new(ranger_hardware::SimulatedSwitch::new()),
    ))
}

/// Prints each reading and optionally cancels the session after a reading
/// quota is met.
struct PrintSink {
    json: bool,
    count: Arc<AtomicU64>,
    cancel: Arc<AtomicBool>,
    max_readings: Option<u64>,
}

impl ReadingSink for PrintSink {
    fn deliver(&mut self, distance_mm: f64, status: i32) {
        if self.json {
            println!(
                "{}",
                serde_json::json!({
                    "distance_mm": distance_mm,
                    "distance_cm": distance_mm / 10.0,
                    "status": status,
                })
            );
        } else if distance_mm <= 0.0 {
            // No reception: the status code is the interesting part.
            match status_label(status) {
                Some(label) => println!("     ---          status {status} ({label})"),
                None => println!("     ---          status {status}"),
            }
        } else {
            println!(
                "{distance_mm:8.1} mm  ({:6.1} cm)   status {status}",
                distance_mm / 10.0
            );
        }

        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(max) = self.max_readings
            && n >= max
        {
            self.cancel.store(true, Ordering::Relaxed);
        }
    }
}

/// Keeps only the most recent reading for polling consumers.
struct LatestCell {
    cell: Arc<Mutex<Option<(f64, i32)>>>,
}

impl ReadingSink for LatestCell {
    fn deliver(&mut self, distance_mm: f64, status: i32) {
        if let Ok(mut slot) = self.cell.lock() {
            *slot = Some((distance_mm, status));
        }
    }
}

/// Counts deliveries and nothing else.
struct CountingSink {
    count: Arc<AtomicU64>,
}

impl ReadingSink for CountingSink {
    fn deliver(&mut self, _distance_mm: f64, _status: i32) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

fn spawn_deadline(cancel: &Arc<AtomicBool>, duration_ms: u64) {
    let cancel = cancel.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(duration_ms));
        cancel.store(true, Ordering::Relaxed);
    });
}

pub fn run_scan(
    cfg: &ranger_config::Config,
    json: bool,
    duration_ms: Option<u64>,
    max_readings: Option<u64>,
    cancel: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let (source, switch) = build_hardware(cfg)?;
    let count = Arc::new(AtomicU64::new(0));
    let sink = PrintSink {
        json,
        count: count.clone(),
        cancel: cancel.clone(),
        max_readings,
    };
    if let Some(ms) = duration_ms {
        spawn_deadline(&cancel, ms);
    }

    let stats = ScanSession::builder()
        .with_source(source)
        .with_switch(switch)
        .with_sink(sink)
        .with_cfg(SessionCfg::from(cfg))
        .build()?
        .run(cancel)?;

    print_scan_summary(json, &stats);
    Ok(())
}

fn print_scan_summary(json: bool, stats: &SessionStats) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "readings": stats.readings,
                "lines": stats.lines,
                "last_distance_mm": stats.last.map(|r| r.distance_mm),
                "last_status": stats.last.map(|r| r.status),
            })
        );
    } else {
        println!(
            "scan finished: {} readings over {} lines",
            stats.readings, stats.lines
        );
    }
}

pub fn run_measure(
    cfg: &ranger_config::Config,
    json: bool,
    points: usize,
    interval_ms: u64,
    cancel: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let (source, switch) = build_hardware(cfg)?;
    let cell: Arc<Mutex<Option<(f64, i32)>>> = Arc::new(Mutex::new(None));
    let sink = LatestCell { cell: cell.clone() };

    let session = ScanSession::builder()
        .with_source(source)
        .with_switch(switch)
        .with_sink(sink)
        .with_cfg(SessionCfg::from(cfg))
        .build()?;

    let session_cancel = cancel.clone();
    let handle = std::thread::spawn(move || session.run(session_cancel));

    let captured = capture_points(&cell, &cancel, points, interval_ms, json);

    // The session must stop and join whatever happened above, so the sensor
    // is switched off before we report anything.
    cancel.store(true, Ordering::Relaxed);
    let session_result = match handle.join() {
        Ok(r) => r,
        Err(_) => Err(eyre::eyre!("scan session thread panicked")),
    };
    let log = captured?;
    let _stats = session_result?;

    print_measure_summary(json, &log);
    Ok(())
}

fn capture_points(
    cell: &Arc<Mutex<Option<(f64, i32)>>>,
    cancel: &Arc<AtomicBool>,
    points: usize,
    interval_ms: u64,
    json: bool,
) -> eyre::Result<MeasurementLog> {
    let mut log = MeasurementLog::new();
    for i in 0..points {
        let (distance_mm, status) = wait_for_reading(cell, cancel, Duration::from_secs(5))?;
        log.save(distance_mm);
        tracing::debug!(distance_mm, status, "measurement saved");
        if !json {
            println!(
                "point {}: {distance_mm:.1} mm ({:.1} cm)",
                i + 1,
                distance_mm / 10.0
            );
        }
        if i + 1 < points {
            sleep_with_cancel(cancel, Duration::from_millis(interval_ms))?;
        }
    }
    Ok(log)
}

fn wait_for_reading(
    cell: &Arc<Mutex<Option<(f64, i32)>>>,
    cancel: &Arc<AtomicBool>,
    timeout: Duration,
) -> eyre::Result<(f64, i32)> {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        if cancel.load(Ordering::Relaxed) {
            eyre::bail!("measurement cancelled");
        }
        if let Ok(slot) = cell.lock()
            && let Some(v) = *slot
        {
            return Ok(v);
        }
        if std::time::Instant::now() >= deadline {
            eyre::bail!("no reading arrived within {timeout:?}");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

fn sleep_with_cancel(cancel: &Arc<AtomicBool>, total: Duration) -> eyre::Result<()> {
    let deadline = std::time::Instant::now() + total;
    while std::time::Instant::now() < deadline {
        if cancel.load(Ordering::Relaxed) {
            eyre::bail!("measurement cancelled");
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    Ok(())
}

fn print_measure_summary(json: bool, log: &MeasurementLog) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "points_mm": log.entries(),
                "area_m2": log.area_m2(),
                "volume_m3": log.volume_m3(),
            })
        );
        return;
    }
    if let Some(area) = log.area_m2() {
        println!("area:   {area:.3} m^2");
    }
    if let Some(volume) = log.volume_m3() {
        println!("volume: {volume:.3} m^3");
    }
    if log.len() < 2 {
        println!("(need at least 2 points for area, 3 for volume)");
    }
}

pub fn run_self_check(json: bool) -> eyre::Result<()> {
    // Always exercises the simulator: self-check validates the pipeline,
    // not the device.
    let count = Arc::new(AtomicU64::new(0));
    let sink = CountingSink {
        count: count.clone(),
    };
    let cancel = Arc::new(AtomicBool::new(false));
    spawn_deadline(&cancel, 400);

    let stats = ScanSession::builder()
        .with_source(ranger_hardware::SimulatedRangeSource::new())
        .with_switch(ranger_hardware::SimulatedSwitch::new())
        .with_sink(sink)
        .build()?
        .run(cancel)?;

    if stats.readings == 0 {
        eyre::bail!("self-check failed: no readings decoded from the simulated stream");
    }
    if json {
        println!(
            "{}",
            serde_json::json!({ "ok": true, "readings": stats.readings })
        );
    } else {
        println!("self-check ok ({} readings)", stats.readings);
    }
    Ok(())
}
