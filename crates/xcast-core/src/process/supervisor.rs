use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::{info, warn};

use crate::ffmpeg::CaptureCommand;

use super::capture::CaptureProcess;
use super::errors::ProcessError;
use super::types::{DrainedOutput, OutputMode, ProcessState};

type Slot = Arc<Mutex<CaptureProcess>>;

/// Capture processes keyed by slot, at most one live process per slot.
///
/// A slot is typically a loopback device path. The registry lock is held
/// only briefly. A blocking [`Supervisor::stop`] holds just that slot's
/// lock; while it does, a launch into the slot is refused and
/// [`poll`](Supervisor::poll), [`drain_output`](Supervisor::drain_output)
/// and [`is_running`](Supervisor::is_running) answer without waiting.
#[derive(Debug, Default)]
pub struct Supervisor {
    slots: Mutex<BTreeMap<String, Slot>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch `command` into `slot`.
    ///
    /// Fails with [`ProcessError::AlreadyRunning`] while the slot's previous
    /// process is alive. The check and the spawn happen under one lock, so
    /// two concurrent launches cannot both succeed.
    pub fn launch(
        &self,
        slot: &str,
        command: &CaptureCommand,
        mode: OutputMode,
    ) -> Result<u32, ProcessError> {
        let mut slots = self.registry();

        if let Some(existing) = slots.get(slot) {
            // None: someone is stopping it right now
            let Some(mut process) = try_lock(existing) else {
                return Err(ProcessError::AlreadyRunning {
                    slot: slot.to_string(),
                });
            };
            if process.poll()?.is_running() {
                return Err(ProcessError::AlreadyRunning {
                    slot: slot.to_string(),
                });
            }
        }

        let process = CaptureProcess::spawn(command, mode)?;
        let pid = process.id();
        slots.insert(slot.to_string(), Arc::new(Mutex::new(process)));

        info!(
            event = "core.supervisor.launch_completed",
            slot = slot,
            pid = pid
        );
        Ok(pid)
    }

    /// Current state of the slot's process. A process that is being
    /// stopped still reports [`ProcessState::Running`].
    pub fn poll(&self, slot: &str) -> Result<ProcessState, ProcessError> {
        let process = self.slot(slot)?;
        match try_lock(&process) {
            Some(mut process) => process.poll(),
            None => Ok(ProcessState::Running),
        }
    }

    /// Stop the slot's process and wait for it. Idempotent.
    pub fn stop(&self, slot: &str) -> Result<ProcessState, ProcessError> {
        let process = self.slot(slot)?;
        let state = lock(&process).stop()?;
        info!(
            event = "core.supervisor.stop_completed",
            slot = slot,
            state = %state
        );
        Ok(state)
    }

    /// Output that arrived since the last drain. Empty while a stop is in
    /// progress; that output stays queued for the next call.
    pub fn drain_output(&self, slot: &str) -> Result<DrainedOutput, ProcessError> {
        let process = self.slot(slot)?;
        Ok(try_lock(&process)
            .map(|mut process| process.drain_output())
            .unwrap_or_default())
    }

    /// Whether `slot` has a live process. Unknown slots are idle.
    pub fn is_running(&self, slot: &str) -> bool {
        match self.slot(slot) {
            Ok(process) => match try_lock(&process) {
                Some(mut process) => process
                    .poll()
                    .map(|state| state.is_running())
                    .unwrap_or(false),
                None => true,
            },
            Err(_) => false,
        }
    }

    pub fn slots(&self) -> Vec<String> {
        self.registry().keys().cloned().collect()
    }

    /// Stop every slot, in slot order. Failures are logged and returned.
    pub fn stop_all(&self) -> Vec<(String, Result<ProcessState, ProcessError>)> {
        let slots: Vec<(String, Slot)> = self
            .registry()
            .iter()
            .map(|(name, process)| (name.clone(), Arc::clone(process)))
            .collect();

        slots
            .into_iter()
            .map(|(name, process)| {
                let result = lock(&process).stop();
                if let Err(e) = &result {
                    warn!(
                        event = "core.supervisor.stop_failed",
                        slot = %name,
                        error = %e
                    );
                }
                (name, result)
            })
            .collect()
    }

    fn registry(&self) -> MutexGuard<'_, BTreeMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, slot: &str) -> Result<Slot, ProcessError> {
        self.registry()
            .get(slot)
            .cloned()
            .ok_or_else(|| ProcessError::SlotNotFound {
                slot: slot.to_string(),
            })
    }
}

fn lock(process: &Slot) -> MutexGuard<'_, CaptureProcess> {
    process.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `None` while another thread holds the slot, i.e. a stop is waiting.
fn try_lock(process: &Slot) -> Option<MutexGuard<'_, CaptureProcess>> {
    match process.try_lock() {
        Ok(process) => Some(process),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}
