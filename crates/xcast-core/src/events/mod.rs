//! Process-wide lifecycle events.
//!
//! Feature modules log their own `core.<area>.*` events. What lives here is
//! the bracket around a whole CLI invocation, so one run can be cut out of a
//! shared log.

use std::any::type_name_of_val;
use std::error::Error;

use tracing::{error, info};

/// First event of a run. Carries the crate version.
pub fn log_app_startup() {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION")
    );
}

pub fn log_app_shutdown() {
    info!(event = "core.app.shutdown_started");
}

/// A command failed and the run is about to exit non-zero.
///
/// `error_type` is the concrete Rust type, which tells capture failures
/// apart from display or config failures with the same message.
pub fn log_app_error(failure: &dyn Error) {
    error!(
        event = "core.app.error_occurred",
        error = %failure,
        error_type = type_name_of_val(failure)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessError;

    #[test]
    fn test_lifecycle_events_without_subscriber() {
        log_app_startup();
        log_app_shutdown();
    }

    #[test]
    fn test_error_event_accepts_core_errors() {
        let failure = ProcessError::SlotNotFound {
            slot: "/dev/video4".to_string(),
        };
        log_app_error(&failure);
        log_app_error(&std::io::Error::other("pipe closed"));
    }
}
