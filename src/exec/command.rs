//! Captured subprocess execution with timeouts and process-group cleanup.
//!
//! Every external program (generator, compiler, runner) goes through
//! [`run_captured`]. The child is placed in its own process group and the
//! group id is registered with the [`ProcessTree`] for the duration of the
//! wait, so a global teardown can kill the child and everything it forked.
//!
//! ## Rules
//! - Output capture is capped; a child that floods stdout cannot exhaust
//!   memory.
//! - On timeout the whole process group is killed, not just the direct
//!   child.
//! - Spawn failures are reported in [`Captured::spawn_error`], not raised;
//!   the caller decides how to record them.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::core::ProcessTree;

/// Cap on captured bytes per stream.
const CAPTURE_LIMIT: u64 = 1024 * 1024;

/// One subprocess invocation.
#[derive(Clone, Debug)]
pub struct Invocation {
    /// Program to execute.
    pub program: String,
    /// Arguments, already split.
    pub args: Vec<String>,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Wall-clock limit for the whole invocation.
    pub timeout: Duration,
}

/// What came back from a subprocess.
#[derive(Clone, Debug, Default)]
pub struct Captured {
    /// Exit code, when the child exited normally.
    pub code: Option<i32>,
    /// Terminating signal number, when the child was signalled (unix).
    pub signal: Option<i32>,
    /// Captured stdout, lossily decoded and capped.
    pub stdout: String,
    /// Captured stderr, lossily decoded and capped.
    pub stderr: String,
    /// True when the wall-clock limit expired and the group was killed.
    pub timed_out: bool,
    /// Set when the child could not be spawned at all.
    pub spawn_error: Option<String>,
}

impl Captured {
    /// True for a clean zero exit without timeout or spawn failure.
    pub fn success(&self) -> bool {
        !self.timed_out && self.spawn_error.is_none() && self.code == Some(0)
    }
}

/// Runs `inv` to completion, capturing output, bounded by its timeout.
///
/// The child's process group is registered with `tree` while it runs, so a
/// concurrent [`ProcessTree::terminate_all`] takes it down too.
pub async fn run_captured(tree: &Arc<ProcessTree>, inv: &Invocation) -> Captured {
    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = &inv.cwd {
        cmd.current_dir(cwd);
    }
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            return Captured {
                spawn_error: Some(err.to_string()),
                ..Captured::default()
            }
        }
    };

    let pid = child.id();
    if let Some(pid) = pid {
        tree.register(pid);
    }

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_task = tokio::spawn(read_capped(stdout));
    let err_task = tokio::spawn(read_capped(stderr));

    let mut captured = Captured::default();
    match tokio::time::timeout(inv.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            captured.code = status.code();
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                captured.signal = status.signal();
            }
        }
        Ok(Err(err)) => {
            captured.spawn_error = Some(err.to_string());
        }
        Err(_) => {
            captured.timed_out = true;
            kill_group(&mut child, pid).await;
        }
    }

    if let Some(pid) = pid {
        tree.release(pid);
    }
    captured.stdout = out_task.await.unwrap_or_default();
    captured.stderr = err_task.await.unwrap_or_default();
    captured
}

/// Kills the child's whole process group, then reaps the direct child.
async fn kill_group(child: &mut tokio::process::Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        // The child is its own group leader, so the group id is its pid.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
    let _ = child.start_kill();
    let _ = child.wait().await;
}

async fn read_capped(stream: Option<impl tokio::io::AsyncRead + Unpin>) -> String {
    let Some(stream) = stream else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = stream.take(CAPTURE_LIMIT).read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}
