//! Privileged evdev backend.
//!
//! The kernel exposes the proximity sensor as an input event device; the
//! stream is obtained by running `getevent -l <device>` (through `su -c`
//! on locked-down systems) and the sensor itself is powered through a
//! sysfs attribute. Both are plain side effects; privilege management is
//! the platform's problem, not ours.

use crate::error::HwError;
use ranger_traits::{LineSource, SensorSwitch, SourceEvent};
use std::io::BufRead;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

/// Streams lines from a `getevent` child process.
///
/// A dedicated reader thread pumps the child's stdout into a channel so
/// `poll_line` can honor its timeout even when the device is quiet. The
/// child is killed and reaped exactly once when the source is dropped.
pub struct DeviceEventSource {
    child: Option<Child>,
    rx: mpsc::Receiver<std::io::Result<String>>,
    eof: bool,
}

impl DeviceEventSource {
    pub fn open(event_path: &str, use_su: bool) -> Result<Self, HwError> {
        let mut cmd = if use_su {
            let mut c = Command::new("su");
            c.arg("-c").arg(format!("getevent -l {event_path}"));
            c
        } else {
            let mut c = Command::new("getevent");
            c.arg("-l").arg(event_path);
            c
        };

        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| HwError::Spawn(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HwError::Spawn("child stdout not captured".to_string()))?;

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let reader = std::io::BufReader::new(stdout);
            for line in reader.lines() {
                if tx.send(line).is_err() {
                    // Consumer gone; stop pumping.
                    break;
                }
            }
            tracing::debug!("event reader thread finished");
        });

        tracing::info!(event_path, use_su, "event stream opened");
        Ok(Self {
            child: Some(child),
            rx,
            eof: false,
        })
    }

    fn shutdown_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "event reader child already gone");
            }
            match child.wait() {
                Ok(status) => tracing::debug!(%status, "event reader child reaped"),
                Err(e) => tracing::warn!(error = %e, "failed to reap event reader child"),
            }
        }
    }
}

impl LineSource for DeviceEventSource {
    fn poll_line(
        &mut self,
        timeout: Duration,
    ) -> Result<SourceEvent, Box<dyn std::error::Error + Send + Sync>> {
        if self.eof {
            return Ok(SourceEvent::Eof);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(line)) => Ok(SourceEvent::Line(line)),
            Ok(Err(e)) => Err(Box::new(HwError::Stream(e.to_string()))),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(SourceEvent::Idle),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.eof = true;
                Ok(SourceEvent::Eof)
            }
        }
    }
}

impl Drop for DeviceEventSource {
    fn drop(&mut self) {
        self.shutdown_child();
    }
}

/// Powers the sensor through its sysfs enable attribute.
pub struct SysfsSwitch {
    enable_path: String,
    use_su: bool,
}

impl SysfsSwitch {
    pub fn new(enable_path: impl Into<String>, use_su: bool) -> Self {
        Self {
            enable_path: enable_path.into(),
            use_su,
        }
    }

    fn write_flag(&self, value: u8) -> Result<(), HwError> {
        if self.use_su {
            let status = Command::new("su")
                .arg("-c")
                .arg(format!("echo {value} > {}", self.enable_path))
                .status()
                .map_err(|e| HwError::Switch(e.to_string()))?;
            if !status.success() {
                return Err(HwError::Switch(format!(
                    "su exited with {status} writing {value}"
                )));
            }
        } else {
            std::fs::write(&self.enable_path, format!("{value}\n"))
                .map_err(|e| HwError::Switch(e.to_string()))?;
        }
        tracing::debug!(path = %self.enable_path, value, "sensor power flag written");
        Ok(())
    }
}

impl SensorSwitch for SysfsSwitch {
    fn enable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write_flag(1).map_err(Into::into)
    }

    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write_flag(0).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sysfs_switch_writes_flags_without_su() {
        let dir = std::env::temp_dir().join(format!("ranger_sw_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("enable_ps_sensor");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            f.write_all(b"0\n").unwrap();
        }

        let mut sw = SysfsSwitch::new(path.to_string_lossy().to_string(), false);
        sw.enable().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n");
        sw.disable().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_enable_file_is_a_switch_error() {
        let mut sw = SysfsSwitch::new("/nonexistent/ranger/enable_ps_sensor", false);
        let err = sw.enable().expect_err("write must fail");
        assert!(err.to_string().contains("switch write failed"));
    }
}
