//! Interpreter subprocess supervision
//!
//! Spawns one interpreter per submission with a cleared environment, caps
//! installed between fork and exec, stdin preloaded with the simulated
//! input, and a wall-clock deadline. Reports raw captured output and timing
//! only; failure semantics belong to [`crate::diagnose`].

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::sandbox::{ExecutionUnit, SandboxError};
use crate::types::truncate_output;

/// PATH visible to the interpreter
const SANDBOX_PATH: &str = "/usr/bin:/bin";

/// How the subprocess ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunVerdict {
    /// Exited normally with this code
    Exited(i32),
    /// Killed by this signal
    Signaled(i32),
    /// Wall-clock deadline expired; the process group was killed
    TimedOut,
}

/// Raw captured result of one run
#[derive(Debug, Clone)]
pub struct RawRun {
    pub verdict: RunVerdict,

    /// Captured stdout, truncated to the configured ceiling
    pub stdout: String,

    /// Captured stderr, truncated to the configured ceiling
    pub stderr: String,

    /// Wall-clock time from spawn to exit (or kill)
    pub elapsed: Duration,
}

impl RawRun {
    pub fn is_success(&self) -> bool {
        matches!(self.verdict, RunVerdict::Exited(0))
    }
}

/// Execute one submission in a fresh execution unit.
///
/// Simulated input lines are preloaded on stdin, each followed by a newline;
/// a program that reads past them hits end-of-input and fails like any
/// interpreter read past EOF, which is not separately caught here. The unit
/// is removed on every exit path, including timeout.
#[instrument(skip_all, fields(inputs = inputs.len(), timeout_secs = timeout.as_secs_f64()))]
pub async fn run_source(
    config: &Config,
    source: &str,
    inputs: &[String],
    timeout: Duration,
) -> Result<RawRun, SandboxError> {
    let unit = ExecutionUnit::create(&config.scratch_root(), source).await?;
    let result = supervise(config, &unit, inputs, timeout).await;
    // close() logs its own failure; the run result stands either way
    let _ = unit.close();
    result
}

async fn supervise(
    config: &Config,
    unit: &ExecutionUnit,
    inputs: &[String],
    timeout: Duration,
) -> Result<RawRun, SandboxError> {
    let mut cmd = Command::new(&config.python_binary);
    cmd.arg("-B") // no bytecode cache in the scratch dir
        .arg("-u") // unbuffered, so partial output survives a kill
        .arg(unit.source_path())
        .current_dir(unit.dir())
        .env_clear()
        .env("PATH", SANDBOX_PATH)
        .env("HOME", unit.dir())
        .env("TMPDIR", unit.dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        let limits = config.default_limits.clone();
        let wall_secs = timeout.as_secs_f64();
        unsafe {
            cmd.pre_exec(move || super::limits::apply_in_child(&limits, wall_secs));
        }
    }
    #[cfg(not(unix))]
    tracing::warn!("resource caps unsupported on this platform, running without them");

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|e| SandboxError::Spawn {
        interpreter: config.python_binary.display().to_string(),
        source: e,
    })?;
    let pid = child.id();

    // The stdin writer runs concurrently so a submission that never reads
    // input cannot block the supervisor; write errors (program exited before
    // consuming its input) are expected and dropped.
    if let Some(mut stdin) = child.stdin.take() {
        let data = joined_inputs(inputs);
        tokio::spawn(async move {
            let _ = stdin.write_all(data.as_bytes()).await;
            let _ = stdin.shutdown().await;
        });
    }

    // Capture caps are in bytes, four per character of the configured
    // ceiling, so the character-exact truncation below always has enough.
    let cap_bytes = config.max_output_length.saturating_mul(4);
    let stdout_task = tokio::spawn(read_capped(child.stdout.take(), cap_bytes));
    let stderr_task = tokio::spawn(read_capped(child.stderr.take(), cap_bytes));

    let verdict = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => {
            let status = status?;
            match status.code() {
                Some(code) => RunVerdict::Exited(code),
                None => RunVerdict::Signaled(exit_signal(&status)),
            }
        }
        Err(_) => {
            debug!(?pid, "wall-clock deadline expired, killing process group");
            kill_process_group(pid);
            let _ = child.kill().await;
            let _ = child.wait().await;
            RunVerdict::TimedOut
        }
    };
    let elapsed = started.elapsed();

    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();
    let stdout = truncate_output(
        &String::from_utf8_lossy(&stdout_bytes),
        config.max_output_length,
    );
    let stderr = truncate_output(
        &String::from_utf8_lossy(&stderr_bytes),
        config.max_output_length,
    );

    debug!(
        ?verdict,
        elapsed_ms = elapsed.as_millis() as u64,
        stdout_len = stdout.len(),
        stderr_len = stderr.len(),
        "run complete"
    );

    Ok(RawRun {
        verdict,
        stdout,
        stderr,
        elapsed,
    })
}

/// Join simulated input lines, each followed by a newline
fn joined_inputs(inputs: &[String]) -> String {
    let mut data = String::with_capacity(inputs.iter().map(|l| l.len() + 1).sum());
    for line in inputs {
        data.push_str(line);
        data.push('\n');
    }
    data
}

/// Read a stream to EOF, retaining at most `cap` bytes.
///
/// Past the cap the stream is still drained, so a chatty child never blocks
/// on a full pipe waiting for a reader that stopped listening.
async fn read_capped(stream: Option<impl AsyncRead + Unpin>, cap: usize) -> Vec<u8> {
    let Some(mut stream) = stream else {
        return Vec::new();
    };

    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if buf.len() < cap {
                    let take = n.min(cap - buf.len());
                    buf.extend_from_slice(&chunk[..take]);
                }
            }
        }
    }
    buf
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt as _;
    status.signal().unwrap_or(0)
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> i32 {
    0
}

/// Kill the subprocess and everything it spawned.
///
/// The child was made its own process group leader, so signalling the
/// negative pid reaches the whole tree.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
