use serde::{Deserialize, Serialize};

use crate::config::StreamConfig;
use crate::display::{ScreenId, WindowId};
use crate::ffmpeg::{CaptureSettings, OutputSize};
use crate::geometry::AbsoluteGeometry;
use crate::v4l2::LoopbackDevice;

/// The screen region a session streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    pub screen: ScreenId,
    /// The window the region was taken from, if any.
    pub window: Option<WindowId>,
    pub geometry: AbsoluteGeometry,
}

/// Output options for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSettings {
    pub fps: u32,
    /// Defaults to the source size.
    pub size: Option<OutputSize>,
    pub scale: bool,
    pub pad: bool,
}

impl From<&StreamConfig> for StreamSettings {
    fn from(config: &StreamConfig) -> Self {
        Self {
            fps: config.fps,
            size: None,
            scale: config.scale,
            pad: config.pad,
        }
    }
}

/// A loopback device with its chosen source and output settings.
///
/// The device path doubles as the supervisor slot, so a device never has
/// two streams.
#[derive(Debug, Clone)]
pub struct StreamSession {
    pub device: LoopbackDevice,
    pub source: Option<StreamSource>,
    pub settings: StreamSettings,
    pub capture: CaptureSettings,
}
