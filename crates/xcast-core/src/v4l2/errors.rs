use crate::errors::XcastError;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to {step} v4l2loopback kernel module:\n\n{stderr}")]
    ConfigureFailed { step: &'static str, stderr: String },

    #[error("'{program}' could not be run (are you root?): {message}")]
    ModprobeUnavailable { program: String, message: String },

    #[error("Failed to list devices with '{program}': {message}")]
    ListFailed { program: String, message: String },

    #[error("Invalid device label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },
}

impl XcastError for DeviceError {
    fn error_code(&self) -> &'static str {
        match self {
            DeviceError::ConfigureFailed { .. } => "DEVICE_CONFIGURE_FAILED",
            DeviceError::ModprobeUnavailable { .. } => "DEVICE_MODPROBE_UNAVAILABLE",
            DeviceError::ListFailed { .. } => "DEVICE_LIST_FAILED",
            DeviceError::InvalidLabel { .. } => "DEVICE_INVALID_LABEL",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            DeviceError::InvalidLabel { .. } | DeviceError::ModprobeUnavailable { .. }
        )
    }
}
