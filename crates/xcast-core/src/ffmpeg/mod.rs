//! ffmpeg command compilation for screenshots and loopback streams.

mod compiler;
mod errors;
mod types;
mod version;

pub use compiler::{compile_capture, compile_capture_with, screenshot_spec, stream_spec};
pub use errors::CaptureError;
pub use types::{CaptureCommand, CaptureFields, CaptureSettings, CaptureSpec, OutputSize, SourceRect};
pub use version::{ffmpeg_version, parse_version_line};
