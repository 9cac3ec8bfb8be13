//! Subprocess execution with streamed output and cancellation.

use crate::OutputSink;
use crate::tools::ProcessExit;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of [`run_streaming`].
#[derive(Debug)]
pub(crate) enum Completion {
    /// The process ended (or never started).
    Finished(ProcessExit),
    /// The token fired; the child has been killed and reaped.
    Cancelled,
}

/// Spawn `program` in `cwd`, forwarding stdout and stderr line by line to
/// `sink` until it exits or `cancel` fires.
///
/// Forwarding tasks are joined before returning, so every line of this
/// process reaches the sink before anything written after the call.
pub(crate) async fn run_streaming(
    program: &Path,
    args: &[String],
    cwd: &Path,
    sink: &Arc<dyn OutputSink>,
    cancel: &CancellationToken,
) -> Completion {
    let mut child = match Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return Completion::Finished(ProcessExit::SpawnFailed(e)),
    };

    let forwarders: Vec<JoinHandle<()>> = [
        child.stdout.take().map(|out| forward(out, Arc::clone(sink))),
        child.stderr.take().map(|err| forward(err, Arc::clone(sink))),
    ]
    .into_iter()
    .flatten()
    .collect();

    let status = tokio::select! {
        status = child.wait() => Some(status),
        _ = cancel.cancelled() => None,
    };

    let Some(status) = status else {
        if let Err(e) = child.kill().await {
            tracing::warn!(program = %program.display(), error = %e, "failed to kill cancelled process");
        }
        // Grandchildren may still hold the pipes open.
        for handle in forwarders {
            handle.abort();
        }
        return Completion::Cancelled;
    };

    for handle in forwarders {
        let _ = handle.await;
    }

    match status {
        Ok(status) => Completion::Finished(ProcessExit::Exited(status.code())),
        Err(e) => Completion::Finished(ProcessExit::SpawnFailed(e)),
    }
}

fn forward<R>(reader: R, sink: Arc<dyn OutputSink>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    // Tools may print non-UTF-8 bytes (e.g. diffs of Latin-1 sources). Decode
    // lossily and keep draining so the child never sees a closed pipe.
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = buf.strip_suffix(b"\n").unwrap_or(&buf);
                    let line = line.strip_suffix(b"\r").unwrap_or(line);
                    sink.append_line(&String::from_utf8_lossy(line));
                }
            }
        }
    })
}

/// Output of [`run_shell`].
#[derive(Debug)]
pub(crate) struct ShellOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run `command` through the platform shell and collect its output.
pub(crate) async fn run_shell(command: &str, cwd: &Path) -> std::io::Result<ShellOutput> {
    let mut cmd = if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    };

    let output = cmd.current_dir(cwd).stdin(Stdio::null()).output().await?;
    Ok(ShellOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run `program args...` and collect its output.
pub(crate) async fn run_captured(
    program: &Path,
    args: &[&str],
    cwd: &Path,
) -> std::io::Result<ShellOutput> {
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .await?;
    Ok(ShellOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
