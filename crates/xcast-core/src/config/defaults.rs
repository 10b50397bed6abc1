//! Default implementations for configuration types.
//!
//! Holds the `Default` implementations and the helper functions used by
//! serde's `#[serde(default = "...")]` attributes.

use crate::config::types::{
    CaptureConfig, CatalogConfig, DevicesConfig, StreamConfig, ThumbnailConfig,
};
use std::path::PathBuf;

pub const DEFAULT_DEVICE_LABEL: &str = "Virtual camera";

pub fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

pub fn default_ffmpeg_log_level() -> String {
    "error".to_string()
}

/// Returns the default screenshot polling rate (120fps).
pub fn default_screenshot_framerate() -> u32 {
    120
}

/// Returns the default minimum window size (64px).
pub fn default_min_window_size() -> u32 {
    64
}

pub fn default_stream_fps() -> u32 {
    30
}

pub fn default_true() -> bool {
    true
}

pub fn default_thumbnail_width() -> u32 {
    320
}

pub fn default_thumbnail_height() -> u32 {
    180
}

pub fn default_thumbnail_concurrency() -> usize {
    4
}

pub fn default_poll_interval_ms() -> u64 {
    100
}

pub fn default_device_labels() -> Vec<String> {
    vec![DEFAULT_DEVICE_LABEL.to_string()]
}

/// Returns `<system temp dir>/xcast/thumbs`.
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("xcast").join("thumbs")
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: default_ffmpeg_binary(),
            ffmpeg_log_level: default_ffmpeg_log_level(),
            screenshot_framerate: default_screenshot_framerate(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            min_window_size: default_min_window_size(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            fps: default_stream_fps(),
            scale: true,
            pad: true,
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: default_thumbnail_width(),
            height: default_thumbnail_height(),
            concurrency: default_thumbnail_concurrency(),
            poll_interval_ms: default_poll_interval_ms(),
            cache_dir: None,
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            labels: default_device_labels(),
            exclusive_caps: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::types::XcastConfig;

    #[test]
    fn test_defaults_match_serde_defaults() {
        let from_default = XcastConfig::default();
        let from_empty: XcastConfig = toml::from_str("").unwrap();

        assert_eq!(
            from_default.capture.screenshot_framerate,
            from_empty.capture.screenshot_framerate
        );
        assert_eq!(
            from_default.catalog.min_window_size,
            from_empty.catalog.min_window_size
        );
        assert_eq!(from_default.stream.fps, from_empty.stream.fps);
        assert_eq!(from_default.stream.pad, from_empty.stream.pad);
        assert_eq!(
            from_default.thumbnails.concurrency,
            from_empty.thumbnails.concurrency
        );
        assert_eq!(from_default.devices.labels, from_empty.devices.labels);
    }

    #[test]
    fn test_default_values() {
        let config = XcastConfig::default();
        assert_eq!(config.capture.screenshot_framerate, 120);
        assert_eq!(config.catalog.min_window_size, 64);
        assert_eq!(config.devices.labels, vec!["Virtual camera".to_string()]);
        assert!(config.stream.scale);
    }
}
