//! Process launcher for the external grader.
//!
//! Runs one child per call with piped stdin/stdout/stderr, a per-invocation
//! deadline, and a SIGTERM-then-SIGKILL escalation. Stdout is the only
//! protocol channel; stderr is diagnostic and is logged, never parsed. An
//! operator shutdown is forwarded to the child so no orphan survives the run.

use crate::error::LaunchError;
use crate::shutdown::ShutdownSignal;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Environment variables that mark an active Python isolation context. They
/// are removed from the child's environment so a venv/uv-managed grader
/// self-selects its own interpreter instead of inheriting ours.
const ISOLATION_ENV_VARS: [&str; 4] = [
    "VIRTUAL_ENV",
    "PYTHONHOME",
    "CONDA_PREFIX",
    "CONDA_DEFAULT_ENV",
];

const STDERR_LOG_LIMIT: usize = 2048;

/// Everything needed to run the grader once. Validated at configuration time
/// and again immediately before each spawn.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub executable: PathBuf,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub kill_grace: Duration,
}

impl LaunchSpec {
    /// Pre-spawn validation: the executable must exist with an execute bit,
    /// and the working directory must be an enterable directory.
    pub fn validate(&self) -> Result<(), LaunchError> {
        let metadata = std::fs::metadata(&self.executable)
            .map_err(|_| LaunchError::NotFound(self.executable.clone()))?;
        if !metadata.is_file() {
            return Err(LaunchError::NotFound(self.executable.clone()));
        }

        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(LaunchError::NotExecutable(self.executable.clone()));
        }

        if let Some(dir) = &self.working_dir {
            let dir_meta = std::fs::metadata(dir)
                .map_err(|_| LaunchError::InvalidWorkingDirectory(dir.clone()))?;
            if !dir_meta.is_dir() {
                return Err(LaunchError::InvalidWorkingDirectory(dir.clone()));
            }
        }

        Ok(())
    }
}

/// The terminal state of one grader invocation.
#[derive(Debug)]
pub enum LaunchResult {
    /// Normal exit. `stdout` is the protocol payload, still subject to decode
    /// validation; `stderr` travels along as diagnostic text.
    Completed {
        exit_code: i32,
        stdout: Vec<u8>,
        stderr: String,
    },
    /// The deadline expired; the child was terminated and any partial stdout
    /// discarded.
    Timeout,
    /// An operator shutdown arrived; the child was terminated.
    Interrupted,
    /// An OS-level failure while spawning or waiting.
    ProcessError(String),
}

/// Run the grader once: write `input` to its stdin, close it, and collect
/// stdout/stderr until exit, deadline, or shutdown.
pub async fn launch(
    spec: &LaunchSpec,
    input: &[u8],
    shutdown: &ShutdownSignal,
) -> Result<LaunchResult, LaunchError> {
    spec.validate()?;

    let mut command = Command::new(&spec.executable);
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Backstop for the no-orphan invariant if this future is dropped.
        .kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }
    for var in ISOLATION_ENV_VARS {
        command.env_remove(var);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return Ok(LaunchResult::ProcessError(format!(
                "Failed to spawn {}: {}",
                spec.executable.display(),
                e
            )));
        }
    };
    let pid = child.id();
    debug!(pid, executable = %spec.executable.display(), "Spawned grader");

    let mut stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // stdout and stderr are drained concurrently so neither pipe can fill and
    // deadlock the other while the child is still writing.
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stdout {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    });

    // One deadline covers the stdin write and the child's exit.
    let deadline = tokio::time::sleep(spec.timeout);
    tokio::pin!(deadline);
    let mut shutdown = shutdown.clone();

    let write_input = async {
        if let Some(mut pipe) = stdin.take() {
            // The child may exit before consuming its input; a broken pipe is
            // tolerated and the exit code decides the result.
            match pipe.write_all(input).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::BrokenPipe => return Ok(()),
                Err(e) => return Err(e),
            }
            match pipe.shutdown().await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    };

    tokio::select! {
        result = write_input => {
            if let Err(e) = result {
                terminate(&mut child, pid, spec.kill_grace).await;
                return Ok(LaunchResult::ProcessError(format!(
                    "Failed to write grader stdin: {}",
                    e
                )));
            }
        }
        () = &mut deadline => {
            warn!(pid, "Grader timed out writing input; terminating");
            terminate(&mut child, pid, spec.kill_grace).await;
            return Ok(LaunchResult::Timeout);
        }
        () = shutdown.listen() => {
            warn!(pid, "Shutdown requested; terminating grader");
            terminate(&mut child, pid, spec.kill_grace).await;
            return Ok(LaunchResult::Interrupted);
        }
    }

    let status = tokio::select! {
        status = child.wait() => {
            match status {
                Ok(status) => status,
                Err(e) => {
                    terminate(&mut child, pid, spec.kill_grace).await;
                    return Ok(LaunchResult::ProcessError(format!(
                        "Failed to wait for grader: {}",
                        e
                    )));
                }
            }
        }
        () = &mut deadline => {
            warn!(pid, "Grader exceeded its timeout; terminating");
            terminate(&mut child, pid, spec.kill_grace).await;
            return Ok(LaunchResult::Timeout);
        }
        () = shutdown.listen() => {
            warn!(pid, "Shutdown requested; terminating grader");
            terminate(&mut child, pid, spec.kill_grace).await;
            return Ok(LaunchResult::Interrupted);
        }
    };

    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();
    let stderr_text = String::from_utf8_lossy(&stderr_bytes).into_owned();
    if !stderr_text.is_empty() {
        debug!(pid, stderr = %truncate(&stderr_text, STDERR_LOG_LIMIT), "Grader stderr");
    }

    // A signal-terminated child has no exit code; report -1.
    let exit_code = status.code().unwrap_or(-1);
    Ok(LaunchResult::Completed {
        exit_code,
        stdout: stdout_bytes,
        stderr: stderr_text,
    })
}

/// Cooperative termination: SIGTERM, wait out the grace period, then SIGKILL.
/// Always reaps the child.
async fn terminate(child: &mut Child, pid: Option<u32>, grace: Duration) {
    if let Some(pid) = pid {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(_) => {}
        Err(_) => {
            warn!(pid, "Grader ignored SIGTERM; sending SIGKILL");
            let _ = child.kill().await;
        }
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
