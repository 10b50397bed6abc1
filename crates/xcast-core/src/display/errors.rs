use crate::errors::XcastError;

use super::types::WindowId;

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// The window vanished while it was being queried.
    /// Callers skip the window rather than fail.
    #[error("Window {id} is gone")]
    WindowGone { id: WindowId },

    /// No connectable display under this name. Ends display probing.
    #[error("Display '{name}' is unavailable: {message}")]
    DisplayUnavailable { name: String, message: String },

    #[error("Connection to display '{name}' lost: {message}")]
    ConnectionLost { name: String, message: String },

    #[error("Screen not found: '{screen}'")]
    ScreenNotFound { screen: String },

    #[error("Window {id} not found on screen '{screen}'")]
    WindowNotFound { screen: String, id: WindowId },
}

impl XcastError for DisplayError {
    fn error_code(&self) -> &'static str {
        match self {
            DisplayError::WindowGone { .. } => "DISPLAY_WINDOW_GONE",
            DisplayError::DisplayUnavailable { .. } => "DISPLAY_UNAVAILABLE",
            DisplayError::ConnectionLost { .. } => "DISPLAY_CONNECTION_LOST",
            DisplayError::ScreenNotFound { .. } => "DISPLAY_SCREEN_NOT_FOUND",
            DisplayError::WindowNotFound { .. } => "DISPLAY_WINDOW_NOT_FOUND",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            DisplayError::ScreenNotFound { .. } | DisplayError::WindowNotFound { .. }
        )
    }
}
