use crate::errors::XcastError;
use crate::ffmpeg::CaptureError;
use crate::process::ProcessError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No source selected for device '{device}'")]
    NoSource { device: String },

    #[error("Capture command error: {source}")]
    CaptureError {
        #[from]
        source: CaptureError,
    },

    #[error("Capture process error: {source}")]
    ProcessError {
        #[from]
        source: ProcessError,
    },
}

impl XcastError for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            SessionError::NoSource { .. } => "SESSION_NO_SOURCE",
            SessionError::CaptureError { source } => source.error_code(),
            SessionError::ProcessError { source } => source.error_code(),
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            SessionError::NoSource { .. } => true,
            SessionError::CaptureError { source } => source.is_user_error(),
            SessionError::ProcessError { source } => source.is_user_error(),
        }
    }
}
