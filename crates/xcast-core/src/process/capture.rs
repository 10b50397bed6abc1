use std::process::{Child, Command, ExitStatus, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{debug, info};

use crate::ffmpeg::CaptureCommand;

use super::errors::ProcessError;
use super::output::StreamBuffer;
use super::types::{DrainedOutput, OutputMode, ProcessState};

/// One launched capture process and its output.
///
/// Dropping a running `CaptureProcess` leaves the child running; call
/// [`CaptureProcess::stop`] first.
pub struct CaptureProcess {
    child: Child,
    command: CaptureCommand,
    stdout: StreamBuffer,
    stderr: StreamBuffer,
    exit: Option<ExitStatus>,
}

impl std::fmt::Debug for CaptureProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureProcess")
            .field("pid", &self.child.id())
            .field("program", &self.command.program)
            .field("exit", &self.exit)
            .finish_non_exhaustive()
    }
}

impl CaptureProcess {
    pub fn spawn(command: &CaptureCommand, mode: OutputMode) -> Result<Self, ProcessError> {
        let (stdout_cfg, stderr_cfg) = match mode {
            OutputMode::Discard => (Stdio::null(), Stdio::null()),
            OutputMode::Capture => (Stdio::piped(), Stdio::piped()),
        };

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(stdout_cfg)
            .stderr(stderr_cfg)
            .spawn()
            .map_err(|e| ProcessError::SpawnFailed {
                program: command.program.clone(),
                message: e.to_string(),
            })?;

        let stdout = match child.stdout.take() {
            Some(pipe) => StreamBuffer::spawn("stdout", pipe),
            None => StreamBuffer::closed(),
        };
        let stderr = match child.stderr.take() {
            Some(pipe) => StreamBuffer::spawn("stderr", pipe),
            None => StreamBuffer::closed(),
        };

        debug!(
            event = "core.process.spawn_completed",
            pid = child.id(),
            program = %command.program,
            mode = ?mode
        );

        Ok(Self {
            child,
            command: command.clone(),
            stdout,
            stderr,
            exit: None,
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn command(&self) -> &CaptureCommand {
        &self.command
    }

    /// Non-blocking state check.
    pub fn poll(&mut self) -> Result<ProcessState, ProcessError> {
        if let Some(status) = self.exit {
            return Ok(exited(status));
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit = Some(status);
                Ok(exited(status))
            }
            Ok(None) => Ok(ProcessState::Running),
            Err(e) => Err(self.wait_failed(e)),
        }
    }

    /// Ask the process to terminate, then block until it has exited.
    ///
    /// Stopping an exited process does nothing and returns its final
    /// state. There is no timeout: a child that ignores SIGTERM blocks
    /// the caller.
    pub fn stop(&mut self) -> Result<ProcessState, ProcessError> {
        if let ProcessState::Exited { code } = self.poll()? {
            return Ok(ProcessState::Exited { code });
        }

        let pid = self.id();
        let raw = i32::try_from(pid).map_err(|_| ProcessError::SignalFailed {
            pid,
            message: "pid out of range".to_string(),
        })?;

        info!(event = "core.process.stop_started", pid = pid);
        match signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
            // Exited between the poll and the signal
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => {
                return Err(ProcessError::SignalFailed {
                    pid,
                    message: e.to_string(),
                });
            }
        }

        let state = self.wait()?;
        info!(event = "core.process.stop_completed", pid = pid, state = %state);
        Ok(state)
    }

    /// Block until the process exits.
    pub fn wait(&mut self) -> Result<ProcessState, ProcessError> {
        self.wait_status().map(exited)
    }

    fn wait_status(&mut self) -> Result<ExitStatus, ProcessError> {
        if let Some(status) = self.exit {
            return Ok(status);
        }
        let status = self.child.wait().map_err(|e| self.wait_failed(e))?;
        self.exit = Some(status);
        Ok(status)
    }

    /// Output that arrived since the last drain. Never blocks.
    pub fn drain_output(&mut self) -> DrainedOutput {
        DrainedOutput {
            stdout: self.stdout.drain(),
            stderr: self.stderr.drain(),
            closed: self.stdout.is_closed() && self.stderr.is_closed(),
        }
    }

    /// The last [`OUTPUT_TAIL_CAPACITY`](super::OUTPUT_TAIL_CAPACITY) bytes
    /// read from stdout.
    pub fn stdout(&self) -> Vec<u8> {
        self.stdout.data()
    }

    /// The last [`OUTPUT_TAIL_CAPACITY`](super::OUTPUT_TAIL_CAPACITY) bytes
    /// read from stderr.
    pub fn stderr(&self) -> Vec<u8> {
        self.stderr.data()
    }

    /// Wait for exit and read both streams to the end.
    ///
    /// A non-zero exit becomes [`ProcessError::ProcessFailed`] carrying the
    /// captured stderr.
    pub fn wait_success(&mut self) -> Result<(), ProcessError> {
        let status = self.wait_status()?;
        self.stdout.drain_to_end();
        self.stderr.drain_to_end();

        if status.success() {
            return Ok(());
        }
        Err(ProcessError::ProcessFailed {
            code: status.code(),
            stderr: String::from_utf8_lossy(&self.stderr()).trim_end().to_string(),
        })
    }

    fn wait_failed(&self, error: std::io::Error) -> ProcessError {
        ProcessError::WaitFailed {
            pid: self.child.id(),
            message: error.to_string(),
        }
    }
}

fn exited(status: ExitStatus) -> ProcessState {
    ProcessState::Exited {
        code: status.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn command(program: &str, args: &[&str]) -> CaptureCommand {
        CaptureCommand {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn wait_for_exit(process: &mut CaptureProcess) -> ProcessState {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let state = process.poll().unwrap();
            if !state.is_running() || Instant::now() > deadline {
                return state;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_poll_reports_exit_code() {
        let mut process =
            CaptureProcess::spawn(&command("sh", &["-c", "exit 3"]), OutputMode::Discard).unwrap();
        assert_eq!(
            wait_for_exit(&mut process),
            ProcessState::Exited { code: Some(3) }
        );
    }

    #[test]
    fn test_stop_terminates_and_is_idempotent() {
        let mut process =
            CaptureProcess::spawn(&command("sleep", &["30"]), OutputMode::Discard).unwrap();
        assert_eq!(process.poll().unwrap(), ProcessState::Running);

        let state = process.stop().unwrap();
        // SIGTERM, so no exit code
        assert_eq!(state, ProcessState::Exited { code: None });
        assert_eq!(process.stop().unwrap(), state);
    }

    #[test]
    fn test_drain_collects_both_streams_until_closed() {
        let mut process = CaptureProcess::spawn(
            &command("sh", &["-c", "printf out; printf err >&2"]),
            OutputMode::Capture,
        )
        .unwrap();
        wait_for_exit(&mut process);

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let drained = process.drain_output();
            stdout.extend(drained.stdout);
            stderr.extend(drained.stderr);
            if drained.closed || Instant::now() > deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(stdout, b"out");
        assert_eq!(stderr, b"err");
        assert_eq!(process.stdout(), b"out");
        assert!(process.drain_output().is_empty());
    }

    #[test]
    fn test_discard_mode_is_closed_immediately() {
        let mut process =
            CaptureProcess::spawn(&command("sh", &["-c", "echo hidden"]), OutputMode::Discard)
                .unwrap();
        assert!(process.drain_output().closed);
        process.wait().unwrap();
    }

    #[test]
    fn test_wait_success_carries_stderr() {
        let mut process = CaptureProcess::spawn(
            &command("sh", &["-c", "echo 'Cannot open display' >&2; exit 1"]),
            OutputMode::Capture,
        )
        .unwrap();

        match process.wait_success() {
            Err(ProcessError::ProcessFailed { code, stderr }) => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "Cannot open display");
            }
            other => panic!("expected ProcessFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_spawn_missing_program() {
        let result = CaptureProcess::spawn(
            &command("xcast-no-such-program", &[]),
            OutputMode::Discard,
        );
        assert!(matches!(result, Err(ProcessError::SpawnFailed { .. })));
    }
}
