//! Configuration type definitions for xcast.
//!
//! These types are serialized/deserialized from TOML config files.
//!
//! # Example Configuration
//!
//! ```toml
//! [capture]
//! ffmpeg_binary = "ffmpeg"
//! ffmpeg_log_level = "error"
//! screenshot_framerate = 120
//!
//! [catalog]
//! min_window_size = 64
//!
//! [stream]
//! fps = 30
//! scale = true
//! pad = true
//!
//! [thumbnails]
//! width = 320
//! height = 180
//! concurrency = 4
//! poll_interval_ms = 100
//!
//! [devices]
//! labels = ["Virtual camera"]
//! exclusive_caps = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration loaded from TOML config files.
///
/// Loaded from `~/.xcast/config.toml` and `./.xcast/config.toml`, with the
/// project file overriding the user file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct XcastConfig {
    /// ffmpeg invocation settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Window discovery settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Defaults for continuous streams to loopback devices
    #[serde(default)]
    pub stream: StreamConfig,

    /// Thumbnail generation settings
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,

    /// v4l2loopback device configuration
    #[serde(default)]
    pub devices: DevicesConfig,
}

/// ffmpeg invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// ffmpeg executable name or path.
    #[serde(default = "super::defaults::default_ffmpeg_binary")]
    pub ffmpeg_binary: String,

    /// Value passed to ffmpeg's `-loglevel`.
    #[serde(default = "super::defaults::default_ffmpeg_log_level")]
    pub ffmpeg_log_level: String,

    /// Input polling rate for one-shot screenshots.
    /// Only one frame is kept, so a high rate just lowers capture latency.
    #[serde(default = "super::defaults::default_screenshot_framerate")]
    pub screenshot_framerate: u32,
}

/// Window discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Windows whose clipped width AND height are both below this are skipped.
    #[serde(default = "super::defaults::default_min_window_size")]
    pub min_window_size: u32,
}

/// Defaults for continuous streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "super::defaults::default_stream_fps")]
    pub fps: u32,

    #[serde(default = "super::defaults::default_true")]
    pub scale: bool,

    #[serde(default = "super::defaults::default_true")]
    pub pad: bool,
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Bounding box width for thumbnails.
    #[serde(default = "super::defaults::default_thumbnail_width")]
    pub width: u32,

    /// Bounding box height for thumbnails.
    #[serde(default = "super::defaults::default_thumbnail_height")]
    pub height: u32,

    /// Maximum number of concurrent ffmpeg processes.
    #[serde(default = "super::defaults::default_thumbnail_concurrency")]
    pub concurrency: usize,

    /// Completion polling interval in milliseconds.
    #[serde(default = "super::defaults::default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Thumbnail cache directory.
    /// Default: `<system temp dir>/xcast/thumbs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// v4l2loopback device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesConfig {
    /// One label per loopback device to create.
    #[serde(default = "super::defaults::default_device_labels")]
    pub labels: Vec<String>,

    /// Pass `exclusive_caps=1` so browsers detect the devices as cameras.
    #[serde(default = "super::defaults::default_true")]
    pub exclusive_caps: bool,
}

impl ThumbnailConfig {
    /// Returns the configured cache directory or the default under the temp dir.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(super::defaults::default_cache_dir)
    }
}
