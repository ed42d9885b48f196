//! Invocation requests and captured results.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

/// Exit code reported for a child that was terminated by `SIGTERM`.
///
/// Shells and most process runtimes encode "killed by signal N" as `128 + N`.
pub const SIGNAL_TERMINATION_EXIT_CODE: i32 = 143;

/// Everything needed to start one external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    argv: Vec<String>,
    working_dir: Option<Utf8PathBuf>,
    stdin: Option<Vec<u8>>,
}

impl CommandRequest {
    /// Create a request from a full argument vector.
    ///
    /// The first element names the executable.
    #[must_use]
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            working_dir: None,
            stdin: None,
        }
    }

    /// Run the process in `dir` instead of the caller's working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Pipe `payload` to the process's standard input, then close it.
    ///
    /// Secrets travel this way so they never appear in process listings.
    #[must_use]
    pub fn with_stdin(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Return the argument vector, executable first.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Return the executable name, if the vector is non-empty.
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Return the working directory override.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Utf8Path> {
        self.working_dir.as_deref()
    }

    /// Return the standard input payload.
    #[must_use]
    pub fn stdin(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }
}

/// Immutable capture of one finished process invocation.
///
/// The stdin payload is deliberately not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    argv: Vec<String>,
    working_dir: Option<Utf8PathBuf>,
    stdout: String,
    stderr: String,
    exit_code: i32,
}

impl CommandResult {
    /// Record the outcome of running `request`.
    #[must_use]
    pub fn new(request: &CommandRequest, stdout: String, stderr: String, exit_code: i32) -> Self {
        Self {
            argv: request.argv.clone(),
            working_dir: request.working_dir.clone(),
            stdout,
            stderr,
            exit_code,
        }
    }

    /// Return the argument vector that was executed.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Return the working directory override, if any.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Utf8Path> {
        self.working_dir.as_deref()
    }

    /// Return captured standard output.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Return captured standard error.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Return the process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Whether the process exited with code zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether the process ended because it received `SIGTERM`.
    #[must_use]
    pub const fn terminated_by_signal(&self) -> bool {
        self.exit_code == SIGNAL_TERMINATION_EXIT_CODE
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  command: {}", self.argv.join(" "))?;
        match &self.working_dir {
            Some(dir) => writeln!(f, "  working directory: {dir}")?,
            None => writeln!(f, "  working directory: (inherited)")?,
        }
        writeln!(f, "  exit code: {}", self.exit_code)?;
        writeln!(f, "  stdout: {}", self.stdout.trim_end())?;
        write!(f, "  stderr: {}", self.stderr.trim_end())
    }
}
