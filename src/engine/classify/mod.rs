//! Classification of failed invocations into typed errors.
//!
//! Failure modes are data: each [`FailureSignature`] pairs a regular
//! expression over stderr with a [`Classification`]. One generic classifier
//! consults the generic table first and an operation-specific table second,
//! so teaching the client about a new engine error string means appending a
//! row, never adding a branch.
//!
//! Patterns may capture a named `subject` group (a missing path, a clashing
//! name) which is carried into the resulting error.

mod signatures;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

pub use self::signatures::{
    CONFIG_SIGNATURES, CONTAINER_SIGNATURES, GENERIC_SIGNATURES, NO_SIGNATURES, SWARM_SIGNATURES,
};
use super::command::CommandResult;
use crate::error::CommandError;

/// Permanent failure categories a signature can designate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The referenced object does not exist.
    NotFound,
    /// The request collides with an existing object.
    Conflict,
    /// The engine is not in a state that allows the request.
    Precondition,
    /// The request itself is malformed.
    InvalidInput,
    /// A local path named by the request does not exist.
    MissingPath,
}

/// How a matched failure should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Safe to retry; the condition is expected to clear.
    Transient,
    /// Retrying cannot help.
    Permanent(ErrorKind),
}

/// A known failure mode of the wrapped executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureSignature {
    /// Stable identifier used in logs and transient errors.
    pub name: &'static str,
    /// Regular expression tested against stderr.
    pub pattern: &'static str,
    /// What a match means.
    pub classification: Classification,
}

/// An ordered, compiled list of failure signatures.
#[derive(Debug)]
pub struct SignatureTable {
    entries: Vec<(FailureSignature, Regex)>,
}

impl SignatureTable {
    /// Compile `signatures`, preserving their order.
    ///
    /// A pattern that fails to compile is logged and skipped so one bad row
    /// cannot disable classification as a whole.
    #[must_use]
    pub fn compile(signatures: &[FailureSignature]) -> Self {
        let entries = signatures
            .iter()
            .filter_map(|signature| match Regex::new(signature.pattern) {
                Ok(regex) => Some((*signature, regex)),
                Err(error) => {
                    warn!(
                        signature = signature.name,
                        error = %error,
                        "invalid failure signature pattern; ignoring"
                    );
                    None
                }
            })
            .collect();
        Self { entries }
    }

    /// Find the first signature whose pattern matches `stderr`.
    #[must_use]
    pub fn find(&self, stderr: &str) -> Option<SignatureMatch> {
        self.entries.iter().find_map(|(signature, regex)| {
            regex.captures(stderr).map(|captures| SignatureMatch {
                signature: *signature,
                subject: captures
                    .name("subject")
                    .map(|subject| String::from(subject.as_str())),
            })
        })
    }

    /// Number of usable signatures in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no usable signatures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The outcome of matching one stderr text against a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch {
    /// The signature that matched.
    pub signature: FailureSignature,
    /// The captured `subject` group, if the pattern defines one.
    pub subject: Option<String>,
}

static GENERIC_TABLE: LazyLock<SignatureTable> =
    LazyLock::new(|| SignatureTable::compile(GENERIC_SIGNATURES));

/// Return the compiled generic signature table.
#[must_use]
pub fn generic_table() -> &'static SignatureTable {
    &GENERIC_TABLE
}

/// Match `stderr` against the generic table, then `specific`.
#[must_use]
pub fn match_stderr(stderr: &str, specific: &SignatureTable) -> Option<SignatureMatch> {
    generic_table()
        .find(stderr)
        .or_else(|| specific.find(stderr))
}

/// Convert a failed invocation into a typed error.
///
/// Unmatched failures become [`CommandError::Unexpected`] carrying the full
/// result.
#[must_use]
pub fn classify(result: &CommandResult, specific: &SignatureTable) -> CommandError {
    let Some(matched) = match_stderr(result.stderr(), specific) else {
        debug!(
            command = %result.argv().join(" "),
            exit_code = result.exit_code(),
            "failure matched no signature"
        );
        return CommandError::Unexpected {
            result: Box::new(result.clone()),
        };
    };

    debug!(
        signature = matched.signature.name,
        exit_code = result.exit_code(),
        "failure classified"
    );
    build_error(&matched, result)
}

fn build_error(matched: &SignatureMatch, result: &CommandResult) -> CommandError {
    let message = first_line(result.stderr());
    let subject = matched
        .subject
        .clone()
        .unwrap_or_else(|| message.clone());

    match matched.signature.classification {
        Classification::Transient => CommandError::Transient {
            signature: matched.signature.name,
            message,
        },
        Classification::Permanent(ErrorKind::NotFound) => CommandError::NotFound { subject },
        Classification::Permanent(ErrorKind::Conflict) => CommandError::Conflict { subject },
        Classification::Permanent(ErrorKind::Precondition) => {
            CommandError::PreconditionFailed { message }
        }
        Classification::Permanent(ErrorKind::InvalidInput) => {
            CommandError::InvalidInput { message }
        }
        Classification::Permanent(ErrorKind::MissingPath) => {
            CommandError::PathNotFound { path: subject }
        }
    }
}

fn first_line(text: &str) -> String {
    let trimmed = text.trim();
    let line = trimmed.lines().next().unwrap_or(trimmed);
    String::from(line.trim())
}
