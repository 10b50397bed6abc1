use crate::ffmpeg::CaptureCommand;

use super::errors::ProcessError;

/// What happens to a child's stdout and stderr. stdin is always null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Fire and forget.
    #[default]
    Discard,
    /// Read incrementally into buffers, see [`DrainedOutput`].
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    /// `code` is `None` when the process was killed by a signal.
    Exited { code: Option<i32> },
}

impl ProcessState {
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessState::Running)
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::Running => write!(f, "running"),
            ProcessState::Exited { code: Some(code) } => write!(f, "exited ({})", code),
            ProcessState::Exited { code: None } => write!(f, "exited (signal)"),
        }
    }
}

/// Bytes that arrived since the previous drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Both streams reached end of file. No further output will arrive.
    pub closed: bool,
}

impl DrainedOutput {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// One queued command for [`super::run_bounded`].
#[derive(Debug, Clone)]
pub struct BatchJob<K> {
    pub key: K,
    pub command: CaptureCommand,
}

#[derive(Debug)]
pub struct JobOutcome<K> {
    pub key: K,
    /// `ProcessFailed` for a non-zero exit, `SpawnFailed` if it never ran.
    pub result: Result<(), ProcessError>,
}

/// Result of a bounded batch. Outcomes are in completion order.
#[derive(Debug)]
pub struct BatchReport<K> {
    pub outcomes: Vec<JobOutcome<K>>,
    /// Highest number of processes that were running at once.
    pub peak_running: usize,
}

impl<K> BatchReport<K> {
    pub fn succeeded(&self) -> impl Iterator<Item = &K> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .map(|outcome| &outcome.key)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .count()
    }
}
