use std::path::PathBuf;
use std::time::Duration;

use crate::config::XcastConfig;
use crate::display::{ScreenId, WindowId};
use crate::ffmpeg::{CaptureCommand, CaptureSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSettings {
    /// Owned by the pipeline; [`super::ThumbnailPipeline::cleanup`] removes it.
    pub cache_dir: PathBuf,
    /// Bounding box each thumbnail is fitted into.
    pub width: u32,
    pub height: u32,
    /// Maximum concurrent ffmpeg processes.
    pub concurrency: usize,
    pub poll_interval: Duration,
    pub min_window_size: u32,
    pub capture: CaptureSettings,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        XcastConfig::default().thumbnail_settings()
    }
}

/// Window ids are only unique per display, so thumbnails are keyed by both.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThumbnailKey {
    pub screen: ScreenId,
    pub window: WindowId,
}

/// One window to capture into `path`.
#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    pub key: ThumbnailKey,
    pub path: PathBuf,
    pub command: CaptureCommand,
}
