//! Known failure signatures of the container engine CLI.
//!
//! Order matters: the first matching row wins.

use super::{Classification, ErrorKind, FailureSignature};

const fn transient(name: &'static str, pattern: &'static str) -> FailureSignature {
    FailureSignature {
        name,
        pattern,
        classification: Classification::Transient,
    }
}

const fn permanent(name: &'static str, pattern: &'static str, kind: ErrorKind) -> FailureSignature {
    FailureSignature {
        name,
        pattern,
        classification: Classification::Permanent(kind),
    }
}

/// Signatures consulted for every operation.
pub static GENERIC_SIGNATURES: &[FailureSignature] = &[
    transient("connection-reset", r"(?i)connection reset by peer"),
    transient(
        "file-locked",
        r"(?i)being used by another process|resource temporarily unavailable|text file busy",
    ),
    transient("access-denied", r"(?i)access is denied"),
    transient(
        "daemon-unreachable",
        r"(?i)error during connect|i/o timeout|tls handshake timeout",
    ),
    permanent(
        "no-such-object",
        r"(?i)no such (?:container|image|object|network|volume|config|secret|service|node)s?:\s*(?P<subject>\S+)",
        ErrorKind::NotFound,
    ),
    permanent(
        "not-swarm-manager",
        r"(?i)this node is not a swarm manager",
        ErrorKind::Precondition,
    ),
    permanent(
        "invalid-reference",
        r"(?i)invalid reference format",
        ErrorKind::InvalidInput,
    ),
    permanent(
        "unknown-flag",
        r"unknown (?:shorthand )?flag:? (?P<subject>\S+)",
        ErrorKind::InvalidInput,
    ),
    permanent(
        "missing-path",
        r#"unable to prepare context: path "(?P<subject>[^"]+)" not found"#,
        ErrorKind::MissingPath,
    ),
];

/// Operation-specific signatures for container lifecycle requests.
pub static CONTAINER_SIGNATURES: &[FailureSignature] = &[
    permanent(
        "container-name-in-use",
        r#"(?i)the container name "/?(?P<subject>[^"]+)" is already in use"#,
        ErrorKind::Conflict,
    ),
    permanent(
        "container-not-running",
        r"(?i)container (?P<subject>\S+) is not running",
        ErrorKind::Precondition,
    ),
];

/// Operation-specific signatures for named configuration objects.
///
/// A name collision is permanent so a retried create can never produce a
/// second object.
pub static CONFIG_SIGNATURES: &[FailureSignature] = &[
    permanent(
        "config-exists",
        r"(?i)config (?:name )?(?P<subject>\S+?)? ?already exists",
        ErrorKind::Conflict,
    ),
    permanent(
        "config-name-conflict",
        r#"(?i)rpc error: code = AlreadyExists desc = config "?(?P<subject>[^" ]+)"?"#,
        ErrorKind::Conflict,
    ),
];

/// Operation-specific signatures for swarm membership requests.
pub static SWARM_SIGNATURES: &[FailureSignature] = &[
    permanent(
        "already-in-swarm",
        r"(?i)this node is already part of a swarm",
        ErrorKind::Conflict,
    ),
    permanent(
        "not-in-swarm",
        r"(?i)this node is not part of a swarm",
        ErrorKind::Precondition,
    ),
];

/// An empty operation-specific table.
pub static NO_SIGNATURES: &[FailureSignature] = &[];
