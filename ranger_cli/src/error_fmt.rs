//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use ranger_core::error::{BuildError, RangerError};
    use ranger_hardware::HwError;

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSource => {
                "What happened: No line source was provided to the scan session.\nLikely causes: The event device failed to open or was not wired into the builder.\nHow to fix: Ensure the event source is created successfully and passed via with_source(...).".to_string()
            }
            BuildError::MissingSwitch => {
                "What happened: No sensor switch was provided to the scan session.\nLikely causes: The sysfs power control failed to initialize or was not wired into the builder.\nHow to fix: Ensure the switch is created successfully and passed via with_switch(...).".to_string()
            }
            BuildError::MissingSink => {
                "What happened: No reading sink was provided to the scan session.\nLikely causes: The consumer side was not wired into the builder.\nHow to fix: Pass a sink via with_sink(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(re) = err.downcast_ref::<RangerError>() {
        return match re {
            RangerError::Source(detail) => format!(
                "What happened: The sensor event stream failed mid-scan ({detail}).\nLikely causes: getevent exited, su was denied, or the device node vanished.\nHow to fix: Check root access and device.event_path in the config, then start a new scan."
            ),
            RangerError::Power(detail) => format!(
                "What happened: The sensor could not be powered on ({detail}).\nLikely causes: Wrong device.enable_path, or no permission to write the sysfs attribute.\nHow to fix: Verify the enable path exists and that su is available when device.use_su is set."
            ),
        };
    }

    if let Some(hw) = err.downcast_ref::<HwError>() {
        return match hw {
            HwError::Spawn(detail) => format!(
                "What happened: Could not start the event reader process ({detail}).\nLikely causes: getevent or su is not on PATH, or the shell denied the command.\nHow to fix: Confirm the platform tools are installed and the device is rooted if device.use_su is set."
            ),
            HwError::Switch(detail) => format!(
                "What happened: Writing the sensor power flag failed ({detail}).\nLikely causes: Wrong device.enable_path or insufficient privileges.\nHow to fix: Fix the path in the config; ensure the process may write the sysfs file."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: The event device disappeared mid-stream.\nHow to fix: Re-plug or re-enable the sensor and start a new scan."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("config") {
        return format!(
            "What happened: Configuration is invalid or unreadable.\nLikely causes: Out-of-range values or malformed TOML.\nHow to fix: Edit the config file and try again. Original: {err:#}"
        );
    }

    if lower.contains("no reading arrived") {
        return "What happened: The pipeline produced no readings in time.\nLikely causes: Sensor occluded, wrong axis marker, or the event stream is silent.\nHow to fix: Check device.axis_marker and that the sensor emits events (try `scan --log-level debug`).".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable machine-readable reason for an error.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    use ranger_core::error::{BuildError, RangerError};
    if let Some(re) = err.downcast_ref::<RangerError>() {
        return match re {
            RangerError::Source(_) => "SourceFailure",
            RangerError::Power(_) => "PowerFailure",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    "Error"
}

/// Map error kinds to stable exit codes; generic errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use ranger_core::error::{BuildError, RangerError};
    if let Some(re) = err.downcast_ref::<RangerError>() {
        return match re {
            RangerError::Source(_) => 3,
            RangerError::Power(_) => 4,
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if err.to_string().to_ascii_lowercase().contains("config") {
        return 2;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
    })
    .to_string()
}
