use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use super::LineTransport;

/// How long to wait for the child to exit after its stdin is closed
/// before killing it outright.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to start child process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("transport closed")]
    Closed,
    #[error("timed out waiting for child process output")]
    Timeout,
    #[error("child process I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport to one subprocess over piped stdin/stdout.
///
/// The child is spawned lazily: constructing the transport only records
/// the command, the process starts on the first `write_line`/`read_line`.
/// State moves `Unstarted -> Running -> Closed` and never backwards;
/// a closed transport stays closed.
pub struct ProcessTransport {
    program: String,
    args: Vec<String>,
    state: TransportState,
}

enum TransportState {
    Unstarted,
    Running(RunningChild),
    Closed,
}

struct RunningChild {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ProcessTransport {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            state: TransportState::Unstarted,
        }
    }

    fn spawn_child(&self) -> Result<RunningChild, TransportError> {
        debug!("Spawning child process: {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(TransportError::Spawn)?;

        let stdin = child.stdin.take().ok_or_else(|| {
            TransportError::Io(std::io::Error::other("child stdin pipe unavailable"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            TransportError::Io(std::io::Error::other("child stdout pipe unavailable"))
        })?;

        Ok(RunningChild {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Transition `Unstarted -> Running` on first use. The `&mut`
    /// receiver guarantees at most one spawn per transport.
    fn running(&mut self) -> Result<&mut RunningChild, TransportError> {
        if matches!(self.state, TransportState::Closed) {
            return Err(TransportError::Closed);
        }
        if matches!(self.state, TransportState::Unstarted) {
            let running = self.spawn_child()?;
            self.state = TransportState::Running(running);
        }
        match &mut self.state {
            TransportState::Running(running) => Ok(running),
            _ => Err(TransportError::Closed),
        }
    }
}

/// Pipe failures mean the process is gone; report them as closure.
fn map_io_error(e: std::io::Error) -> TransportError {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof => {
            TransportError::Closed
        }
        _ => TransportError::Io(e),
    }
}

#[async_trait]
impl LineTransport for ProcessTransport {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let running = self.running()?;
        running
            .stdin
            .write_all(line.as_bytes())
            .await
            .map_err(map_io_error)?;
        running.stdin.write_all(b"\n").await.map_err(map_io_error)?;
        running.stdin.flush().await.map_err(map_io_error)?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, TransportError> {
        let running = self.running()?;
        let mut line = String::new();
        let n = running
            .stdout
            .read_line(&mut line)
            .await
            .map_err(map_io_error)?;
        if n == 0 {
            // EOF: the child exited or closed its stdout.
            return Err(TransportError::Closed);
        }
        Ok(line.trim().to_string())
    }

    async fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, TransportState::Closed);
        if let TransportState::Running(running) = state {
            let RunningChild {
                mut child, stdin, ..
            } = running;
            // Dropping stdin closes the pipe; a well-behaved child exits
            // on EOF. Escalate to kill if it lingers.
            drop(stdin);
            match tokio::time::timeout(CLOSE_GRACE, child.wait()).await {
                Ok(Ok(status)) => debug!("Child process exited: {}", status),
                Ok(Err(e)) => warn!("Failed to reap child process: {}", e),
                Err(_) => {
                    warn!("Child process did not exit in time, killing it");
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill child process: {}", e);
                    }
                }
            }
        }
    }
}
