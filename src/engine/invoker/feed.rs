//! Streaming child processes for live event feeds.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{EventFeed, FinishFuture, NextLineFuture, exit_code_of, program_name, spawn_child};
use crate::engine::command::{CommandRequest, CommandResult};
use crate::error::CommandError;

/// How long a terminated child may take to exit before it is killed outright.
const TERMINATION_GRACE: Duration = Duration::from_secs(5);

/// How long stderr may stay open after the feed process has exited.
///
/// A descendant that inherited the pipe can hold it open indefinitely.
const STDERR_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Stdout lines kept for the final [`CommandResult`].
const STDOUT_TAIL_LINES: usize = 20;

/// An [`EventFeed`] backed by a real child process.
///
/// Stdout is read one line at a time with no read-ahead beyond the current
/// line. Stderr is drained in the background so the child never blocks on a
/// full pipe.
///
/// The result returned by `finish` carries only the last
/// `STDOUT_TAIL_LINES` stdout lines, since a feed can run for hours.
pub struct ChildFeed {
    request: CommandRequest,
    child: Child,
    lines: Option<Lines<BufReader<ChildStdout>>>,
    stderr: Arc<Mutex<Vec<u8>>>,
    stderr_task: Option<JoinHandle<()>>,
    stdout_tail: VecDeque<String>,
}

impl ChildFeed {
    /// Start `request` and attach to its output streams.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::SpawnFailed` when the process cannot be started.
    pub fn spawn(request: CommandRequest) -> Result<Self, CommandError> {
        let mut child = spawn_child(&request)?;
        let lines = child
            .stdout
            .take()
            .map(|stdout| BufReader::new(stdout).lines());
        let stderr = Arc::new(Mutex::new(Vec::new()));
        let stderr_task = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(drain_stderr(pipe, Arc::clone(&stderr))));

        debug!(command = %request.argv().join(" "), "event feed started");

        Ok(Self {
            request,
            child,
            lines,
            stderr,
            stderr_task,
            stdout_tail: VecDeque::with_capacity(STDOUT_TAIL_LINES),
        })
    }

    async fn read_line(&mut self) -> Result<Option<String>, CommandError> {
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        let next = lines
            .next_line()
            .await
            .map_err(|error| CommandError::from_io(program_name(&self.request), &error))?;
        match next {
            Some(line) => {
                if self.stdout_tail.len() == STDOUT_TAIL_LINES {
                    self.stdout_tail.pop_front();
                }
                self.stdout_tail.push_back(line.clone());
                Ok(Some(line))
            }
            None => {
                self.lines = None;
                Ok(None)
            }
        }
    }

    async fn wait_for_exit(&mut self) -> Result<CommandResult, CommandError> {
        let program = String::from(program_name(&self.request));
        let status = match tokio::time::timeout(TERMINATION_GRACE, self.child.wait()).await {
            Ok(waited) => waited.map_err(|error| CommandError::from_io(&program, &error))?,
            Err(_elapsed) => {
                warn!(program = %program, "event feed ignored termination; killing");
                self.child
                    .kill()
                    .await
                    .map_err(|error| CommandError::from_io(&program, &error))?;
                self.child
                    .wait()
                    .await
                    .map_err(|error| CommandError::from_io(&program, &error))?
            }
        };

        if let Some(mut task) = self.stderr_task.take() {
            match tokio::time::timeout(STDERR_DRAIN_GRACE, &mut task).await {
                Ok(joined) => joined.map_err(|error| CommandError::Interrupted {
                    program: program.clone(),
                    message: error.to_string(),
                })?,
                Err(_elapsed) => {
                    debug!(program = %program, "stderr still held open after exit; detaching");
                    task.abort();
                }
            }
        }
        let stderr = {
            let captured = self.stderr.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&captured).into_owned()
        };

        let exit_code = exit_code_of(status);
        debug!(program = %program, exit_code, "event feed exited");

        let stdout = Vec::from(std::mem::take(&mut self.stdout_tail)).join("\n");
        Ok(CommandResult::new(&self.request, stdout, stderr, exit_code))
    }
}

/// Copy stderr into `sink` as it arrives so a partial capture survives an
/// aborted drain.
async fn drain_stderr(mut pipe: ChildStderr, sink: Arc<Mutex<Vec<u8>>>) {
    let mut chunk = [0_u8; 4096];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(read) => {
                let mut captured = sink.lock().unwrap_or_else(PoisonError::into_inner);
                captured.extend_from_slice(chunk.get(..read).unwrap_or_default());
            }
            Err(error) => {
                debug!(%error, "stderr read failed");
                break;
            }
        }
    }
}

impl EventFeed for ChildFeed {
    fn next_line(&mut self) -> NextLineFuture<'_> {
        Box::pin(self.read_line())
    }

    fn terminate(&mut self) -> Result<(), CommandError> {
        let Some(pid) = self.child.id() else {
            // Already reaped.
            return Ok(());
        };
        send_terminate(pid, program_name(&self.request))
    }

    fn finish(&mut self) -> FinishFuture<'_> {
        Box::pin(self.wait_for_exit())
    }
}

#[cfg(unix)]
fn send_terminate(pid: u32, program: &str) -> Result<(), CommandError> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw_pid = i32::try_from(pid).map_err(|_| CommandError::Interrupted {
        program: String::from(program),
        message: format!("process id {pid} is out of range"),
    })?;

    match kill(Pid::from_raw(raw_pid), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(CommandError::Interrupted {
            program: String::from(program),
            message: format!("failed to send SIGTERM: {errno}"),
        }),
    }
}

#[cfg(not(unix))]
fn send_terminate(_pid: u32, _program: &str) -> Result<(), CommandError> {
    // Without POSIX signals the child is stopped by `finish`'s kill fallback.
    Ok(())
}
