use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MODULE_NAME: &str = "v4l2loopback";

/// Substring of the `v4l2-ctl --list-devices` header line of loopback devices.
pub const LOOPBACK_MARKER: &str = "platform:v4l2loopback";

/// A configured loopback device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopbackDevice {
    pub label: String,
    /// Device node, e.g. `/dev/video4`.
    pub path: PathBuf,
}
