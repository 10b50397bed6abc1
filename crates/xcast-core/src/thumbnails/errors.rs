use std::path::PathBuf;

use crate::errors::XcastError;

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("Failed to {action} thumbnail cache '{}': {source}", .path.display())]
    CacheDir {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl XcastError for ThumbnailError {
    fn error_code(&self) -> &'static str {
        match self {
            ThumbnailError::CacheDir { .. } => "THUMBNAIL_CACHE_DIR",
        }
    }
}
