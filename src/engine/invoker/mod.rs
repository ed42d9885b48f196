//! Process invocation behind a small trait seam.
//!
//! [`ProcessInvoker`] starts exactly one external process per call. Buffered
//! invocations drain stdout and stderr concurrently and return a
//! [`CommandResult`]; a non-zero exit is a normal outcome, not an error.
//! Streaming invocations return an [`EventFeed`] that yields stdout one line at
//! a time until the caller terminates it.
//!
//! The seam keeps retry, classification, and waiting logic testable without a
//! container engine on the host.

mod feed;

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tracing::debug;

pub use self::feed::ChildFeed;
use super::command::{CommandRequest, CommandResult};
use crate::error::CommandError;

/// Boxed future returned by [`ProcessInvoker::invoke`].
pub type InvokeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CommandResult, CommandError>> + Send + 'a>>;

/// Boxed future returned by [`EventFeed::next_line`].
pub type NextLineFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<String>, CommandError>> + Send + 'a>>;

/// Boxed future returned by [`EventFeed::finish`].
pub type FinishFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CommandResult, CommandError>> + Send + 'a>>;

/// A live, line-oriented output stream from one long-running process.
pub trait EventFeed: Send {
    /// Wait for the next complete stdout line.
    ///
    /// Returns `Ok(None)` once the process closes its stdout.
    fn next_line(&mut self) -> NextLineFuture<'_>;

    /// Ask the process to stop by sending it a termination signal.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Interrupted` when the signal cannot be delivered.
    fn terminate(&mut self) -> Result<(), CommandError>;

    /// Wait for the process to exit and capture its final state.
    fn finish(&mut self) -> FinishFuture<'_>;
}

/// Behaviour required to run the container engine executable.
pub trait ProcessInvoker {
    /// Run `request` to completion, capturing stdout, stderr, and exit code.
    fn invoke(&self, request: &CommandRequest) -> InvokeFuture<'_>;

    /// Start `request` as a long-running process and stream its stdout.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::SpawnFailed` when the process cannot be started.
    fn open_feed(&self, request: &CommandRequest) -> Result<Box<dyn EventFeed>, CommandError>;
}

/// Invoker that starts real operating system processes via `tokio::process`.
///
/// Children are killed when their handle is dropped, so cancelling an
/// in-flight operation never leaks a process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInvoker;

impl ProcessInvoker for SystemInvoker {
    fn invoke(&self, request: &CommandRequest) -> InvokeFuture<'_> {
        let request_owned = request.clone();
        Box::pin(async move { run_to_completion(request_owned).await })
    }

    fn open_feed(&self, request: &CommandRequest) -> Result<Box<dyn EventFeed>, CommandError> {
        let feed = ChildFeed::spawn(request.clone())?;
        Ok(Box::new(feed))
    }
}

async fn run_to_completion(request: CommandRequest) -> Result<CommandResult, CommandError> {
    let mut child = spawn_child(&request)?;
    let program = program_name(&request);

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let ((), stdout_text, stderr_text) = tokio::try_join!(
        write_stdin(stdin, request.stdin()),
        read_to_string(stdout),
        read_to_string(stderr),
    )
    .map_err(|error| CommandError::from_io(program, &error))?;

    let status = child
        .wait()
        .await
        .map_err(|error| CommandError::from_io(program, &error))?;
    let exit_code = exit_code_of(status);

    debug!(
        command = %request.argv().join(" "),
        exit_code,
        "process exited"
    );

    Ok(CommandResult::new(
        &request,
        stdout_text,
        stderr_text,
        exit_code,
    ))
}

/// Spawn `request` with piped stdout and stderr.
///
/// Stdin is piped only when the request carries a payload.
pub(super) fn spawn_child(request: &CommandRequest) -> Result<Child, CommandError> {
    let Some((program, args)) = request.argv().split_first() else {
        return Err(CommandError::InvalidInput {
            message: String::from("argument vector must name an executable"),
        });
    };

    let stdin = if request.stdin().is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = request.working_dir() {
        command.current_dir(dir);
    }

    command.spawn().map_err(|error| CommandError::SpawnFailed {
        program: program.clone(),
        message: error.to_string(),
    })
}

pub(super) fn program_name(request: &CommandRequest) -> &str {
    request.program().unwrap_or_default()
}

async fn write_stdin(stdin: Option<ChildStdin>, payload: Option<&[u8]>) -> io::Result<()> {
    let (Some(mut pipe), Some(bytes)) = (stdin, payload) else {
        return Ok(());
    };

    let written = match pipe.write_all(bytes).await {
        Ok(()) => pipe.shutdown().await,
        Err(error) => Err(error),
    };

    // A child that exits without reading its input reports through its exit
    // code, not through the pipe.
    match written {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

pub(super) async fn read_to_string<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<String> {
    let mut buffer = Vec::new();
    if let Some(mut reader) = pipe {
        reader.read_to_end(&mut buffer).await?;
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Normalise an exit status to a single integer code.
///
/// Signal deaths are reported as `128 + signal`, matching shell conventions.
pub(super) fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return 128_i32.saturating_add(signal);
        }
    }

    -1
}
