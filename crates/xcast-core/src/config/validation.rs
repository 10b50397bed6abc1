//! Configuration validation logic.
//!
//! Ensures configuration values are usable before anything is launched.

use crate::config::types::XcastConfig;
use crate::errors::ConfigError;

/// Validate an XcastConfig, returning an error if any values are invalid.
///
/// # Validation Rules
///
/// - Framerates, sizes, concurrency and poll interval must be non-zero
/// - The ffmpeg binary must not be empty
/// - Device labels must be non-empty and must not contain commas
///   (they are comma-joined into the `card_label` module parameter)
pub fn validate_config(config: &XcastConfig) -> Result<(), ConfigError> {
    if config.capture.ffmpeg_binary.trim().is_empty() {
        return Err(invalid("capture.ffmpeg_binary must not be empty"));
    }

    let non_zero: [(&str, u64); 8] = [
        (
            "capture.screenshot_framerate",
            config.capture.screenshot_framerate.into(),
        ),
        (
            "catalog.min_window_size",
            config.catalog.min_window_size.into(),
        ),
        ("stream.fps", config.stream.fps.into()),
        ("thumbnails.width", config.thumbnails.width.into()),
        ("thumbnails.height", config.thumbnails.height.into()),
        (
            "thumbnails.concurrency",
            config.thumbnails.concurrency as u64,
        ),
        (
            "thumbnails.poll_interval_ms",
            config.thumbnails.poll_interval_ms,
        ),
        ("devices.labels", config.devices.labels.len() as u64),
    ];

    if let Some((name, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
        return Err(invalid(&format!("{} must be greater than zero", name)));
    }

    validate_device_labels(&config.devices.labels)
}

/// Validate loopback device labels.
pub fn validate_device_labels(labels: &[String]) -> Result<(), ConfigError> {
    crate::v4l2::validate_labels(labels).map_err(|e| invalid(&e.to_string()))
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.to_string(),
    }
}
