use std::collections::VecDeque;
use std::fmt::Debug;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::capture::CaptureProcess;
use super::types::{BatchJob, BatchReport, JobOutcome, OutputMode};

/// Run `jobs` with at most `limit` processes alive at once.
///
/// A finished process's place is refilled from the queue on the next poll.
/// Returns once the queue is empty and every launched process has exited.
/// A `limit` of zero is treated as one. Completion is detected by polling
/// every `poll_interval`.
pub fn run_bounded<K: Debug>(
    jobs: Vec<BatchJob<K>>,
    limit: usize,
    poll_interval: Duration,
) -> BatchReport<K> {
    let limit = limit.max(1);
    let total = jobs.len();
    let mut queue: VecDeque<BatchJob<K>> = jobs.into();
    let mut running: Vec<(K, CaptureProcess)> = Vec::with_capacity(limit);
    let mut outcomes = Vec::with_capacity(total);
    let mut peak_running = 0;

    info!(
        event = "core.batch.run_started",
        jobs = total,
        limit = limit
    );

    loop {
        while running.len() < limit {
            let Some(job) = queue.pop_front() else {
                break;
            };
            match CaptureProcess::spawn(&job.command, OutputMode::Capture) {
                Ok(process) => running.push((job.key, process)),
                Err(e) => {
                    warn!(
                        event = "core.batch.job_spawn_failed",
                        key = ?job.key,
                        error = %e
                    );
                    outcomes.push(JobOutcome {
                        key: job.key,
                        result: Err(e),
                    });
                }
            }
        }
        peak_running = peak_running.max(running.len());

        if running.is_empty() {
            break;
        }

        let before = running.len();
        let mut index = 0;
        while index < running.len() {
            match running[index].1.poll() {
                Ok(state) if state.is_running() => index += 1,
                _ => {
                    let (key, mut process) = running.swap_remove(index);
                    let result = process.wait_success();
                    debug!(
                        event = "core.batch.job_completed",
                        key = ?key,
                        success = result.is_ok()
                    );
                    outcomes.push(JobOutcome { key, result });
                }
            }
        }

        if running.len() == before {
            thread::sleep(poll_interval);
        }
    }

    let report = BatchReport {
        outcomes,
        peak_running,
    };
    info!(
        event = "core.batch.run_completed",
        jobs = total,
        failed = report.failed_count(),
        peak_running = report.peak_running
    );
    report
}
