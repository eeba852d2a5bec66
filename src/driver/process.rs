//! Child process execution with a wall-clock limit.

use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;

#[derive(Debug)]
pub enum ProcessOutcome {
    Completed(Output),
    /// The child, or a descendant still holding its pipes, outlived the
    /// limit. The child was killed and reaped.
    TimedOut,
    SpawnFailed(io::Error),
    /// The child started but its exit status could not be collected.
    WaitFailed(io::Error),
}

fn drain<R>(pipe: Option<R>, stream: &'static str) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(err) = pipe.read_to_end(&mut buf).await {
                tracing::debug!(stream, error = %err, "pipe read failed");
            }
        }
        buf
    })
}

/// Run `cmd` to completion with captured stdout/stderr, killing it once
/// `limit` elapses. The limit covers both the exit and draining the pipes.
/// There are no retries.
pub async fn run_with_timeout(mut cmd: Command, limit: Duration) -> ProcessOutcome {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(command = ?cmd.as_std(), ?limit, "spawning");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return ProcessOutcome::SpawnFailed(err),
    };

    let mut stdout_task = drain(child.stdout.take(), "stdout");
    let mut stderr_task = drain(child.stderr.take(), "stderr");

    let finished = timeout(limit, async {
        let status = child.wait().await?;
        let stdout = (&mut stdout_task).await.unwrap_or_default();
        let stderr = (&mut stderr_task).await.unwrap_or_default();
        Ok::<_, io::Error>(Output {
            status,
            stdout,
            stderr,
        })
    })
    .await;

    match finished {
        Ok(Ok(output)) => ProcessOutcome::Completed(output),
        Ok(Err(err)) => {
            stdout_task.abort();
            stderr_task.abort();
            ProcessOutcome::WaitFailed(err)
        }
        Err(_) => {
            if let Err(err) = child.kill().await {
                tracing::debug!(error = %err, "kill after timeout failed");
            }
            stdout_task.abort();
            stderr_task.abort();
            tracing::debug!(?limit, "child timed out and was killed");
            ProcessOutcome::TimedOut
        }
    }
}
