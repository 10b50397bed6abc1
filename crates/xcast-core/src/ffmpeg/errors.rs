use crate::errors::XcastError;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Rejected before anything is launched.
    #[error("Invalid capture spec: {field} {message}")]
    InvalidSpec { field: String, message: String },
}

impl CaptureError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        CaptureError::InvalidSpec {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl XcastError for CaptureError {
    fn error_code(&self) -> &'static str {
        match self {
            CaptureError::InvalidSpec { .. } => "CAPTURE_INVALID_SPEC",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, CaptureError::InvalidSpec { .. })
    }
}
