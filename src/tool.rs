//! External tool invocation
//!
//! Every pipeline stage that shells out goes through [`ToolRunner`]: spawn,
//! capture stderr, poll for exit while watching the cancellation flag and the
//! optional per-stage timeout. On timeout or cancellation the child is
//! killed; nothing already written to disk is cleaned up.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Exit status and captured diagnostics of a finished tool process.
#[derive(Debug)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Why a tool run did not produce an exit status.
#[derive(Debug)]
pub enum RunFailure {
    /// The process could not be spawned at all (missing binary, permissions)
    Spawn { message: String },
    /// The per-stage timeout expired and the child was killed
    Timeout { seconds: u64 },
    /// The cancellation flag was raised and the child was killed
    Cancelled,
}

/// Runs external tools with a shared cancellation flag and optional timeout.
#[derive(Clone)]
pub struct ToolRunner {
    cancel: Arc<AtomicBool>,
    timeout: Option<Duration>,
    /// Stream captured stderr lines to our stderr as they arrive (-v)
    echo: bool,
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

impl ToolRunner {
    pub fn new(cancel: Arc<AtomicBool>, timeout: Option<Duration>, echo: bool) -> Self {
        Self {
            cancel,
            timeout,
            echo,
        }
    }

    /// Runner that never cancels or times out.
    pub fn unconstrained() -> Self {
        Self::new(Arc::new(AtomicBool::new(false)), None, false)
    }

    /// Spawn `program` with `args`, block until it exits, is cancelled, or
    /// times out. Stderr is captured in full; stdout is discarded (the tools
    /// in this pipeline report on stderr).
    pub fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<ToolOutput, RunFailure> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| RunFailure::Spawn {
            message: e.to_string(),
        })?;

        // Drain stderr on a thread so the child never blocks on a full pipe.
        let stderr = child.stderr.take();
        let echo = self.echo;
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(stream) = stderr {
                for line in BufReader::new(stream).lines() {
                    let Ok(line) = line else { break };
                    if echo {
                        eprintln!("{line}");
                    }
                    buf.push_str(&line);
                    buf.push('\n');
                }
            }
            buf
        });

        let started = Instant::now();
        let status = loop {
            if self.cancel.load(Ordering::SeqCst) {
                let _ = child.kill();
                let _ = child.wait();
                // Do not join the reader: an orphaned grandchild may still
                // hold the pipe open, and the thread exits with the process.
                return Err(RunFailure::Cancelled);
            }
            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunFailure::Timeout {
                        seconds: limit.as_secs(),
                    });
                }
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunFailure::Spawn {
                        message: e.to_string(),
                    });
                }
            }
        };

        let stderr = reader.join().unwrap_or_default();
        Ok(ToolOutput {
            code: status.code(),
            stderr,
        })
    }
}

/// Resolved external tool binaries for one run.
///
/// Paths come from config/environment so tests and exotic setups can
/// substitute their own binaries.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub cargo: PathBuf,
    pub wasm_bindgen: PathBuf,
    pub wasm_opt: PathBuf,
}
