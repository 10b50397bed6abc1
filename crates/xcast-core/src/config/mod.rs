//! # Configuration System
//!
//! Hierarchical TOML configuration for xcast.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.xcast/config.toml` (global user preferences)
//! 3. **Project config** - `./.xcast/config.toml` (directory-specific overrides)
//! 4. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Usage Example
//!
//! ```toml
//! # ~/.xcast/config.toml
//! [capture]
//! ffmpeg_binary = "/usr/local/bin/ffmpeg"
//!
//! [stream]
//! fps = 25
//!
//! [thumbnails]
//! concurrency = 8
//!
//! [devices]
//! labels = ["Desktop", "Browser"]
//! ```
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use xcast_core::config::XcastConfig;
//!
//! fn example() -> Result<(), xcast_core::errors::ConfigError> {
//!     let config = XcastConfig::load_hierarchy()?;
//!     let settings = config.capture_settings();
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{
    CaptureConfig, CatalogConfig, DevicesConfig, StreamConfig, ThumbnailConfig, XcastConfig,
};
pub use validation::validate_config;

use crate::errors::ConfigError;
use crate::ffmpeg::CaptureSettings;
use crate::thumbnails::ThumbnailSettings;

impl XcastConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }

    /// Settings the command compiler needs from `[capture]`.
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            ffmpeg_binary: self.capture.ffmpeg_binary.clone(),
            log_level: self.capture.ffmpeg_log_level.clone(),
            screenshot_framerate: self.capture.screenshot_framerate,
            ..CaptureSettings::default()
        }
    }

    /// Settings for a thumbnail pipeline built from `[thumbnails]`.
    pub fn thumbnail_settings(&self) -> ThumbnailSettings {
        ThumbnailSettings {
            cache_dir: self.thumbnails.cache_dir(),
            width: self.thumbnails.width,
            height: self.thumbnails.height,
            concurrency: self.thumbnails.concurrency,
            poll_interval: std::time::Duration::from_millis(self.thumbnails.poll_interval_ms),
            min_window_size: self.catalog.min_window_size,
            capture: self.capture_settings(),
        }
    }
}
