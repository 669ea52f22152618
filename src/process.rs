//! External process execution for the instrumentation and syntax tools
//!
//! Both tools take their input on stdin and are configured as an argv
//! prefix (`["node", "src/instrument.js"]`) to which call-specific arguments
//! are appended.

use crate::error::{ProxyError, ProxyResult};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished process
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// stdout followed by stderr, lossily decoded
    pub fn combined(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text
    }
}

/// Convert a `timeout_secs` setting into a limit (0 = none)
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Render an argv for log and error messages
pub fn display_command(command: &[String], extra: &[String]) -> String {
    command
        .iter()
        .chain(extra)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `command + extra_args`, feeding `input` on stdin.
///
/// `env` is added on top of the inherited environment. With a `timeout` the
/// child is killed once the limit passes; without one the call waits for as
/// long as the child runs.
pub async fn run_with_input(
    label: &'static str,
    command: &[String],
    extra_args: &[String],
    env: &[(&str, &str)],
    input: &[u8],
    timeout: Option<Duration>,
) -> ProxyResult<Captured> {
    let (program, base_args) = command
        .split_first()
        .ok_or(ProxyError::EmptyCommand(label))?;
    let shown = display_command(command, extra_args);
    debug!("Executing: {}", shown);

    let mut child = Command::new(program)
        .args(base_args)
        .args(extra_args)
        .envs(env.iter().copied())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ProxyError::command_failed(&shown, e))?;

    let stdin = child.stdin.take();
    let input = input.to_vec();
    let feed = async move {
        if let Some(mut stdin) = stdin {
            // A tool may exit without draining stdin; its exit status decides
            if let Err(e) = stdin.write_all(&input).await {
                debug!("stdin closed early: {}", e);
            }
            let _ = stdin.shutdown().await;
        }
    };
    let run = async {
        let (_, output) = tokio::join!(feed, child.wait_with_output());
        output
    };

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .map_err(|_| ProxyError::ToolTimeout {
                command: shown.clone(),
                secs: limit.as_secs(),
            })?,
        None => run.await,
    }
    .map_err(|e| ProxyError::command_failed(&shown, e))?;

    Ok(Captured {
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
