use crate::errors::XcastError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Slot '{slot}' already has a running process")]
    AlreadyRunning { slot: String },

    #[error("No process in slot '{slot}'")]
    SlotNotFound { slot: String },

    #[error("Failed to start '{program}': {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Process exited with {}: {stderr}", exit_description(.code))]
    ProcessFailed { code: Option<i32>, stderr: String },

    #[error("Failed to signal process {pid}: {message}")]
    SignalFailed { pid: u32, message: String },

    #[error("Failed to wait for process {pid}: {message}")]
    WaitFailed { pid: u32, message: String },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

impl XcastError for ProcessError {
    fn error_code(&self) -> &'static str {
        match self {
            ProcessError::AlreadyRunning { .. } => "PROCESS_ALREADY_RUNNING",
            ProcessError::SlotNotFound { .. } => "PROCESS_SLOT_NOT_FOUND",
            ProcessError::SpawnFailed { .. } => "PROCESS_SPAWN_FAILED",
            ProcessError::ProcessFailed { .. } => "PROCESS_FAILED",
            ProcessError::SignalFailed { .. } => "PROCESS_SIGNAL_FAILED",
            ProcessError::WaitFailed { .. } => "PROCESS_WAIT_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ProcessError::AlreadyRunning { .. } | ProcessError::SlotNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failed_display() {
        let error = ProcessError::ProcessFailed {
            code: Some(1),
            stderr: "No such device".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Process exited with code 1: No such device"
        );

        let killed = ProcessError::ProcessFailed {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(killed.to_string(), "Process exited with a signal: ");
    }

    #[test]
    fn test_already_running_is_user_error() {
        let error = ProcessError::AlreadyRunning {
            slot: "/dev/video0".to_string(),
        };
        assert_eq!(error.error_code(), "PROCESS_ALREADY_RUNNING");
        assert!(error.is_user_error());
    }
}
