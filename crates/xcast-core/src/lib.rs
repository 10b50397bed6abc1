//! xcast-core: Core library for capturing X11 windows with ffmpeg
//!
//! This library discovers capturable windows, resolves their on-screen
//! geometry, compiles ffmpeg capture commands and supervises the resulting
//! capture processes. It is used by the `xcast` CLI.
//!
//! # Main Entry Points
//!
//! - [`catalog`] - Probe displays, list screens and interesting windows
//! - [`geometry`] - Absolute, screen-clipped window geometry
//! - [`ffmpeg`] - Compile screenshot and stream commands
//! - [`process`] - Launch, poll, drain and stop capture processes
//! - [`thumbnails`] - Bounded-concurrency thumbnail generation
//! - [`v4l2`] - Loopback device listing and configuration
//! - [`session`] - Per-device stream sessions
//! - [`config`] - Configuration management

pub mod catalog;
pub mod config;
pub mod display;
pub mod errors;
pub mod events;
pub mod ffmpeg;
pub mod geometry;
pub mod logging;
pub mod process;
pub mod session;
pub mod thumbnails;
pub mod v4l2;

// Re-export commonly used types at crate root for convenience
pub use catalog::{CatalogEntry, Discovery, WindowFilter};
pub use config::XcastConfig;
pub use display::{Screen, ScreenId, Window, WindowId, WindowSystem};
pub use ffmpeg::{CaptureCommand, CaptureSpec, OutputSize, SourceRect};
pub use geometry::AbsoluteGeometry;
pub use process::{OutputMode, ProcessState, Supervisor};
pub use session::StreamSession;
pub use thumbnails::ThumbnailPipeline;

// Re-export logging initialization
pub use logging::init_logging;
