//! Semantic error types for the dockside library.
//!
//! This module defines the error hierarchy for dockside, following the
//! principle of using semantic error enums (via `thiserror`) for conditions the
//! caller might inspect, retry, or branch on, while reserving opaque errors
//! (`eyre::Report`) for the application boundary.
//!
//! [`CommandError`] carries the taxonomy used by the command execution core:
//! transient failures that the retry engine absorbs, domain failures that
//! propagate immediately, deadline expiry, and unclassified failures that keep
//! the full [`CommandResult`] for triage.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::engine::CommandResult;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A required configuration value is missing.
    #[error("missing required configuration: {field}")]
    MissingRequired {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors produced while driving the container engine executable.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The executable could not be started at all.
    #[error("failed to start '{program}': {message}")]
    SpawnFailed {
        /// The program that failed to start.
        program: String,
        /// A description of the spawn failure.
        message: String,
    },

    /// Waiting on a child process was interrupted.
    #[error("interrupted while waiting for '{program}': {message}")]
    Interrupted {
        /// The program being waited on.
        program: String,
        /// A description of the interruption.
        message: String,
    },

    /// A failure expected to clear up if the operation is retried.
    #[error("transient failure ({signature}): {message}")]
    Transient {
        /// Name of the failure signature or I/O condition that matched.
        signature: &'static str,
        /// The diagnostic text that was matched.
        message: String,
    },

    /// The referenced object does not exist.
    #[error("no such object: {subject}")]
    NotFound {
        /// The name or identifier that could not be found.
        subject: String,
    },

    /// The request collides with an existing object.
    #[error("conflict: '{subject}' is already in use")]
    Conflict {
        /// The name that is already taken.
        subject: String,
    },

    /// The engine is not in a state that permits the request.
    #[error("precondition not met: {message}")]
    PreconditionFailed {
        /// The engine's explanation.
        message: String,
    },

    /// The engine rejected the request as malformed.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// The engine's explanation.
        message: String,
    },

    /// A local path referenced by the request does not exist.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The missing path as reported by the engine.
        path: String,
    },

    /// The deadline passed before the operation could complete.
    #[error("deadline exceeded while {operation} after {attempts} attempt(s)")]
    Timeout {
        /// The logical operation that timed out.
        operation: String,
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// A non-zero exit that matched no known failure signature.
    #[error("unexpected response from container engine:\n{result}")]
    Unexpected {
        /// The full capture of the failed invocation.
        result: Box<CommandResult>,
    },

    /// An event stream closed before the awaited condition was observed.
    #[error("event stream closed before the awaited condition was observed:\n{result}")]
    StreamEnded {
        /// The capture of the event stream process.
        result: Box<CommandResult>,
    },

    /// The engine produced output that could not be parsed.
    #[error("malformed engine output: {message}")]
    MalformedOutput {
        /// A description of the parse failure.
        message: String,
    },
}

impl CommandError {
    /// Whether the retry engine may re-run the operation that produced this
    /// error.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Map an I/O failure raised while talking to a child process.
    ///
    /// Connection and pipe hiccups become [`Self::Transient`]; anything else
    /// is reported as an interruption of `program`.
    #[must_use]
    pub fn from_io(program: &str, error: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
            | ErrorKind::Interrupted => Self::Transient {
                signature: "io",
                message: format!("{program}: {error}"),
            },
            _ => Self::Interrupted {
                program: String::from(program),
                message: error.to_string(),
            },
        }
    }
}

/// Top-level error type for the dockside library.
///
/// This enum aggregates all domain-specific errors into a single type. At the
/// application boundary (main.rs), these errors are converted to
/// `eyre::Report` for human-readable error reporting.
#[derive(Debug, Error)]
pub enum DocksideError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred while driving the container engine.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// A specialised `Result` type for dockside operations.
pub type Result<T> = std::result::Result<T, DocksideError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CommandRequest;
    use eyre::Report;
    use rstest::{fixture, rstest};

    /// Fixture providing a sample configuration file path.
    #[fixture]
    fn config_path() -> PathBuf {
        PathBuf::from("/etc/dockside/config.toml")
    }

    /// Fixture providing a failed invocation capture.
    #[fixture]
    fn failed_result() -> CommandResult {
        let request = CommandRequest::new(["docker", "volume", "prune", "--force"])
            .with_working_dir("/srv/app");
        CommandResult::new(
            &request,
            String::from("partial output"),
            String::from("Error response from daemon: a prune operation is already running"),
            1,
        )
    }

    #[rstest]
    fn config_error_file_not_found_displays_correctly(config_path: PathBuf) {
        let error = ConfigError::FileNotFound { path: config_path };
        assert_eq!(
            error.to_string(),
            "configuration file not found: /etc/dockside/config.toml"
        );
    }

    #[rstest]
    #[case(
        "retry.max_backoff_ms",
        "must be at least retry.initial_backoff_ms",
        "invalid configuration value for 'retry.max_backoff_ms': must be at least retry.initial_backoff_ms"
    )]
    #[case(
        "binary",
        "cannot be empty",
        "invalid configuration value for 'binary': cannot be empty"
    )]
    fn config_error_invalid_value_displays_correctly(
        #[case] field: &str,
        #[case] reason: &str,
        #[case] expected: &str,
    ) {
        let error = ConfigError::InvalidValue {
            field: String::from(field),
            reason: String::from(reason),
        };
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn config_error_ortho_config_displays_correctly() {
        let ortho_error = ortho_config::OrthoError::Validation {
            key: String::from("retry.timeout_secs"),
            message: String::from("must be a positive integer"),
        };
        let error = ConfigError::OrthoConfig(Arc::new(ortho_error));
        assert_eq!(
            error.to_string(),
            "configuration loading failed: Validation failed for 'retry.timeout_secs': must be a positive integer"
        );
    }

    #[rstest]
    #[case(
        CommandError::NotFound { subject: String::from("web-1") },
        "no such object: web-1"
    )]
    #[case(
        CommandError::Conflict { subject: String::from("/web-1") },
        "conflict: '/web-1' is already in use"
    )]
    #[case(
        CommandError::Timeout { operation: String::from("creating config"), attempts: 3 },
        "deadline exceeded while creating config after 3 attempt(s)"
    )]
    #[case(
        CommandError::PathNotFound { path: String::from("/tmp/ctx") },
        "path not found: /tmp/ctx"
    )]
    fn command_error_displays_correctly(#[case] error: CommandError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn unexpected_error_carries_full_diagnostics(failed_result: CommandResult) {
        let error = CommandError::Unexpected {
            result: Box::new(failed_result),
        };
        let message = error.to_string();

        assert!(message.contains("docker volume prune --force"));
        assert!(message.contains("/srv/app"));
        assert!(message.contains("exit code: 1"));
        assert!(message.contains("partial output"));
        assert!(message.contains("a prune operation is already running"));
    }

    #[rstest]
    #[case(std::io::ErrorKind::ConnectionReset, true)]
    #[case(std::io::ErrorKind::BrokenPipe, true)]
    #[case(std::io::ErrorKind::Interrupted, true)]
    #[case(std::io::ErrorKind::PermissionDenied, false)]
    #[case(std::io::ErrorKind::NotFound, false)]
    fn io_errors_map_to_expected_transience(
        #[case] kind: std::io::ErrorKind,
        #[case] transient: bool,
    ) {
        let error = CommandError::from_io("docker", &std::io::Error::new(kind, "boom"));
        assert_eq!(error.is_transient(), transient);
    }

    #[rstest]
    fn only_transient_variant_is_transient() {
        assert!(
            !CommandError::Timeout {
                operation: String::from("waiting"),
                attempts: 1,
            }
            .is_transient()
        );
        assert!(
            !CommandError::NotFound {
                subject: String::from("x"),
            }
            .is_transient()
        );
        assert!(
            CommandError::Transient {
                signature: "connection-reset",
                message: String::from("read: connection reset by peer"),
            }
            .is_transient()
        );
    }

    #[rstest]
    fn dockside_error_wraps_config_error() {
        let config_error = ConfigError::MissingRequired {
            field: String::from("binary"),
        };
        let error: DocksideError = config_error.into();
        assert_eq!(error.to_string(), "missing required configuration: binary");
    }

    #[rstest]
    #[case(
        DocksideError::from(ConfigError::MissingRequired {
            field: String::from("binary"),
        }),
        "missing required configuration: binary"
    )]
    #[case(
        DocksideError::from(CommandError::NotFound {
            subject: String::from("abc123"),
        }),
        "no such object: abc123"
    )]
    fn eyre_report_preserves_error_messages(#[case] error: DocksideError, #[case] expected: &str) {
        let report = Report::from(error);
        assert_eq!(report.to_string(), expected);
    }
}
