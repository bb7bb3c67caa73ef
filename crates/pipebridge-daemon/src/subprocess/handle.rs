//! Duplex handle to the bridged child process.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::ProcessSink;

/// Size of a single stdout read. Chunks are forwarded as read, with no
/// reassembly into logical message boundaries.
const STDOUT_CHUNK_BYTES: usize = 8192;

/// Configuration for spawning the bridged child process.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Grace period after SIGINT before the child is killed.
    pub terminate_timeout: Duration,
}

/// Event emitted by the child's stdio tasks.
#[derive(Debug)]
pub enum ChildEvent {
    /// One chunk read from the child's stdout, byte-for-byte as read.
    Output(Vec<u8>),
    /// The child exited on its own with the given code.
    Exited(i32),
    /// The child's streams failed; treated as a fatal subprocess error.
    Failed(String),
}

/// Errors from subprocess operations.
#[derive(Debug, thiserror::Error)]
pub enum SubprocessError {
    #[error("Failed to spawn subprocess: {reason}")]
    SpawnFailed { reason: String },
}

/// Cheap cloneable sink for the child's stdin.
///
/// Lets the forwarding engine write while the owning handle stays with
/// `main` for lifecycle control.
#[derive(Clone)]
pub struct ChildSink {
    stdin_tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ProcessSink for ChildSink {
    fn write(&self, payload: &[u8]) -> bool {
        self.stdin_tx.send(payload.to_vec()).is_ok()
    }
}

/// Handle to the running child process.
///
/// One instance per daemon run; the child is never replaced.
pub struct ChildHandle {
    stdin_tx: mpsc::UnboundedSender<Vec<u8>>,
    term_tx: watch::Sender<bool>,
    wait_task: tokio::task::JoinHandle<()>,
    pid: Option<u32>,
}

impl ChildHandle {
    /// Spawn the child and wire up its stdio tasks.
    ///
    /// Returns the handle plus the receiver for output/exit/error events.
    pub fn spawn(
        config: SpawnConfig,
    ) -> Result<(Self, mpsc::Receiver<ChildEvent>), SubprocessError> {
        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        info!(program = %config.program, args = ?config.args, "Spawning bridged subprocess");
        let mut child = cmd.spawn().map_err(|e| SubprocessError::SpawnFailed {
            reason: e.to_string(),
        })?;
        let pid = child.id();

        let (event_tx, event_rx) = mpsc::channel::<ChildEvent>(64);

        // Stdin writer task. Payloads arrive verbatim and are flushed
        // immediately; a write error ends the task, after which the sink
        // reports itself unwritable and later payloads are dropped upstream.
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SubprocessError::SpawnFailed {
                reason: "Failed to capture stdin".to_string(),
            })?;
        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(payload) = stdin_rx.recv().await {
                if let Err(e) = stdin.write_all(&payload).await {
                    error!(error = %e, "Failed to write to child stdin");
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    error!(error = %e, "Failed to flush child stdin");
                    break;
                }
            }
            debug!("stdin writer finished");
        });

        // Stdout chunk reader. Chunks go out exactly as read; EOF is silent
        // here because the wait task reports the exit.
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SubprocessError::SpawnFailed {
                reason: "Failed to capture stdout".to_string(),
            })?;
        let stdout_events = event_tx.clone();
        tokio::spawn(async move {
            let mut stdout = stdout;
            let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if stdout_events
                            .send(ChildEvent::Output(buf[..n].to_vec()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        stdout_events
                            .send(ChildEvent::Failed(format!("stdout read error: {e}")))
                            .await
                            .ok();
                        break;
                    }
                }
            }
            debug!("stdout reader finished");
        });

        // Stderr reader for diagnostics only.
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let reader = BufReader::new(stderr);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(target: "pipebridge_daemon::child_stderr", "{line}");
                }
                debug!("stderr reader finished");
            });
        }

        // Wait task: owns the child, reports a natural exit, or runs the
        // graceful termination ladder when the handle is told to terminate.
        let (term_tx, mut term_rx) = watch::channel(false);
        let terminate_timeout = config.terminate_timeout;
        let wait_task = tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) => {
                        let code = status.code().unwrap_or(1);
                        info!(code, "Subprocess exited");
                        event_tx.send(ChildEvent::Exited(code)).await.ok();
                    }
                    Err(e) => {
                        event_tx
                            .send(ChildEvent::Failed(format!("wait failed: {e}")))
                            .await
                            .ok();
                    }
                },
                _ = term_rx.changed() => {
                    terminate_child(&mut child, terminate_timeout).await;
                }
            }
        });

        Ok((
            Self {
                stdin_tx,
                term_tx,
                wait_task,
                pid,
            },
            event_rx,
        ))
    }

    /// Process identifier of the child, if still known.
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Writable sink for the child's stdin.
    pub fn sink(&self) -> ChildSink {
        ChildSink {
            stdin_tx: self.stdin_tx.clone(),
        }
    }

    /// Terminate the child if it has not already exited and wait for the
    /// wait task to wind down. Safe to call after a natural exit.
    pub async fn terminate(self) {
        let _ = self.term_tx.send(true);
        self.wait_task.await.ok();
    }
}

impl ProcessSink for ChildHandle {
    fn write(&self, payload: &[u8]) -> bool {
        self.stdin_tx.send(payload.to_vec()).is_ok()
    }
}

/// Graceful termination ladder: SIGINT, wait with timeout, then SIGKILL.
async fn terminate_child(child: &mut tokio::process::Child, grace: Duration) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: pid is a valid process ID obtained from our own Child
            // handle. kill(2) with SIGINT is safe on any owned subprocess.
            #[allow(unsafe_code)]
            #[allow(clippy::cast_possible_wrap)]
            let ret = unsafe { libc::kill(pid as i32, libc::SIGINT) };
            if ret != 0 {
                let err = std::io::Error::last_os_error();
                warn!(pid, error = %err, "Failed to send SIGINT");
            }
        }
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            info!(?status, "Subprocess terminated gracefully");
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Error waiting for subprocess");
            child.kill().await.ok();
        }
        Err(_) => {
            warn!("Timeout waiting for graceful shutdown, killing subprocess");
            child.kill().await.ok();
        }
    }
}
