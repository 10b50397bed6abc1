//! Thumbnails for every interesting window, generated under a concurrency cap.

mod errors;
mod pipeline;
mod types;

pub use errors::ThumbnailError;
pub use pipeline::ThumbnailPipeline;
pub use types::{ThumbnailJob, ThumbnailKey, ThumbnailSettings};
