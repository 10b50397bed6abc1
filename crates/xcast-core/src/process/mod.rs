//! Launching and supervising capture processes.
//!
//! [`CaptureProcess`] wraps one child process. [`Supervisor`] keys processes
//! by slot and refuses a second launch into an occupied slot.
//! [`run_bounded`] drives a queue of jobs under a concurrency cap.

mod batch;
mod capture;
mod errors;
mod output;
mod supervisor;
mod types;

pub use batch::run_bounded;
pub use capture::CaptureProcess;
pub use errors::ProcessError;
pub use output::{OUTPUT_TAIL_CAPACITY, OutputTail};
pub use supervisor::Supervisor;
pub use types::{BatchJob, BatchReport, DrainedOutput, JobOutcome, OutputMode, ProcessState};
