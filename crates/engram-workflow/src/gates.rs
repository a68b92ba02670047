//! Quality-gate execution.
//!
//! Gates are shell commands attached to a workflow stage. Each run is
//! bounded by the configured timeout; a gate that outlives the deadline
//! is killed and recorded as timed out rather than failed, so the
//! distinction survives into the execution history.

use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use engram_core::model::{ExpectedResult, Gate, GateOutcome};
use tracing::{debug, warn};

use crate::error::WorkflowError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cooperative cancellation handle for an in-flight gate batch. Cloning
/// shares the flag, so an operator thread can cancel from outside.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Runs gate commands through the system shell.
#[derive(Debug, Clone)]
pub struct GateRunner {
    timeout: Duration,
}

/// Everything captured from a single gate run.
#[derive(Debug, Clone)]
pub struct GateRun {
    pub command: String,
    pub outcome: GateOutcome,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl GateRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Execute one gate to completion, deadline, or cancellation.
    pub fn run(&self, gate: &Gate, cancel: &CancelToken) -> Result<GateRun, WorkflowError> {
        let started = Instant::now();
        if cancel.is_cancelled() {
            return Ok(GateRun::skipped(gate, "cancelled before start"));
        }
        debug!(command = %gate.command, "running quality gate");

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&gate.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(engram_core::CoreError::from)?;

        // Drain both pipes on their own threads while we poll. A gate
        // that writes more than the pipe buffer would otherwise block on
        // write and never exit.
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        enum Exit {
            Finished(std::process::ExitStatus),
            TimedOut,
            Cancelled,
        }

        let deadline = started + self.timeout;
        let exit = loop {
            match child.try_wait().map_err(engram_core::CoreError::from)? {
                Some(status) => break Exit::Finished(status),
                None if cancel.is_cancelled() => {
                    warn!(command = %gate.command, "gate cancelled mid-run, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                    break Exit::Cancelled;
                }
                None if Instant::now() >= deadline => {
                    warn!(command = %gate.command, timeout_secs = self.timeout.as_secs(),
                          "gate exceeded deadline, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                    break Exit::TimedOut;
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        // Killing the child closed its end of the pipes, so the readers
        // finish promptly in every exit path.
        let stdout = String::from_utf8_lossy(&stdout_reader.join().unwrap_or_default()).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_reader.join().unwrap_or_default()).into_owned();

        let outcome = match exit {
            Exit::TimedOut => GateOutcome::TimedOut,
            Exit::Cancelled => GateOutcome::Skipped {
                reason: "cancelled by operator".into(),
            },
            Exit::Finished(status) if status.success() => GateOutcome::Passed,
            Exit::Finished(status) => GateOutcome::Failed {
                exit_code: status.code().unwrap_or(-1),
            },
        };

        Ok(GateRun {
            command: gate.command.clone(),
            outcome,
            stdout,
            stderr,
            duration_ms,
        })
    }
}

impl GateRun {
    fn skipped(gate: &Gate, reason: &str) -> Self {
        Self {
            command: gate.command.clone(),
            outcome: GateOutcome::Skipped {
                reason: reason.into(),
            },
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> std::thread::JoinHandle<Vec<u8>>
where
    R: std::io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            use std::io::Read;
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Whether a gate's outcome satisfies its declared expectation.
///
/// A red-phase gate (`ExpectedResult::Failure`) is satisfied by any
/// non-zero exit; a timeout satisfies nothing but `Any`.
pub fn satisfies(outcome: &GateOutcome, expected: ExpectedResult) -> bool {
    match expected {
        ExpectedResult::Any => !matches!(outcome, GateOutcome::TimedOut),
        ExpectedResult::Success => matches!(outcome, GateOutcome::Passed),
        ExpectedResult::Failure => matches!(outcome, GateOutcome::Failed { .. }),
    }
}
