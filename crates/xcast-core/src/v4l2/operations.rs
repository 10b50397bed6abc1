use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::config::defaults::DEFAULT_DEVICE_LABEL;

use super::errors::DeviceError;
use super::types::{LOOPBACK_MARKER, LoopbackDevice, MODULE_NAME};

const V4L2_CTL: &str = "v4l2-ctl";
const MODPROBE: &str = "modprobe";
const MODINFO: &str = "modinfo";
/// modinfo often lives outside a regular user's PATH.
const MODINFO_FALLBACK: &str = "/sbin/modinfo";

/// Loopback devices in `v4l2-ctl --list-devices` output.
///
/// Each header line containing [`LOOPBACK_MARKER`] is paired with the line
/// after it, which holds the device node. The label is the header up to
/// its last space.
pub fn parse_device_listing(text: &str) -> Vec<LoopbackDevice> {
    let mut devices = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if !line.contains(LOOPBACK_MARKER) {
            continue;
        }
        let header = line.trim_end();
        let label = header
            .rsplit_once(' ')
            .map_or(header, |(label, _)| label)
            .trim()
            .to_string();

        let Some(path) = lines.next().map(str::trim).filter(|p| !p.is_empty()) else {
            debug!(event = "core.v4l2.listing_truncated", label = %label);
            break;
        };
        devices.push(LoopbackDevice {
            label,
            path: PathBuf::from(path),
        });
    }

    devices
}

/// Configured loopback devices, via `v4l2-ctl --list-devices`.
///
/// v4l2-ctl exits non-zero when any video device cannot be opened, so the
/// exit status is ignored and whatever was listed is parsed.
pub fn list_devices() -> Result<Vec<LoopbackDevice>, DeviceError> {
    let output = Command::new(V4L2_CTL)
        .arg("--list-devices")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| DeviceError::ListFailed {
            program: V4L2_CTL.to_string(),
            message: e.to_string(),
        })?;

    let devices = parse_device_listing(&String::from_utf8_lossy(&output.stdout));
    debug!(event = "core.v4l2.list_completed", count = devices.len());
    Ok(devices)
}

/// Whether the v4l2loopback module is installed.
pub fn module_available() -> bool {
    let program = which::which(MODINFO).unwrap_or_else(|_| PathBuf::from(MODINFO_FALLBACK));
    Command::new(program)
        .args(["-n", MODULE_NAME])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Whether the v4l2loopback module is currently loaded.
pub fn module_loaded() -> bool {
    match std::fs::read_to_string("/proc/modules") {
        Ok(text) => parse_proc_modules(&text),
        Err(e) => {
            debug!(event = "core.v4l2.proc_modules_unreadable", error = %e);
            false
        }
    }
}

pub fn parse_proc_modules(text: &str) -> bool {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|name| name == MODULE_NAME)
}

/// Labels must be non-empty and free of commas, which separate them on
/// the module command line.
pub fn validate_labels(labels: &[String]) -> Result<(), DeviceError> {
    for label in labels {
        if label.trim().is_empty() {
            return Err(DeviceError::InvalidLabel {
                label: label.clone(),
                reason: "must not be empty".to_string(),
            });
        }
        if label.contains(',') {
            return Err(DeviceError::InvalidLabel {
                label: label.clone(),
                reason: "must not contain a comma".to_string(),
            });
        }
    }
    Ok(())
}

/// Arguments for loading the module with one device per label.
pub fn modprobe_args(labels: &[String], exclusive_caps: bool) -> Vec<String> {
    vec![
        MODULE_NAME.to_string(),
        format!("exclusive_caps={}", u8::from(exclusive_caps)),
        format!("devices={}", labels.len()),
        format!("card_label={}", labels.join(",")),
    ]
}

/// Replace the current loopback devices with one device per label.
///
/// Unloads and reloads the kernel module, so any stream into an existing
/// device is cut. With no labels a single default-labelled device is
/// created. Returns the devices listed after reloading.
pub fn configure_devices(
    labels: &[String],
    exclusive_caps: bool,
) -> Result<Vec<LoopbackDevice>, DeviceError> {
    let labels = if labels.is_empty() {
        vec![DEFAULT_DEVICE_LABEL.to_string()]
    } else {
        labels.to_vec()
    };
    validate_labels(&labels)?;

    info!(
        event = "core.v4l2.configure_started",
        devices = labels.len(),
        exclusive_caps = exclusive_caps
    );

    run_modprobe("remove", &["-r".to_string(), MODULE_NAME.to_string()])?;
    run_modprobe("add", &modprobe_args(&labels, exclusive_caps))?;

    let devices = list_devices()?;
    info!(event = "core.v4l2.configure_completed", count = devices.len());
    Ok(devices)
}

fn run_modprobe(step: &'static str, args: &[String]) -> Result<(), DeviceError> {
    let output = Command::new(MODPROBE)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| DeviceError::ModprobeUnavailable {
            program: MODPROBE.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(DeviceError::ConfigureFailed {
            step,
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        });
    }
    Ok(())
}
