//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `DOCKSIDE_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `warn`
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use clap::ValueEnum;
use tracing::Level;

/// Environment variable consulted when no CLI level is given.
pub const LOG_ENV_VAR: &str = "DOCKSIDE_LOG";

/// Verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages.
    Info,
    /// Per-invocation detail.
    Debug,
    /// Everything.
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

/// Pick the effective level from the CLI flag and the environment.
#[must_use]
pub fn resolve_level<E: mockable::Env>(cli_level: Option<LogLevel>, env: &E) -> Level {
    cli_level.map_or_else(
        || {
            env.string(LOG_ENV_VAR)
                .and_then(|value| parse_level_str(&value))
                .unwrap_or(Level::WARN)
        },
        Level::from,
    )
}

/// Install the global fmt subscriber writing to stderr.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging<E: mockable::Env>(
    cli_level: Option<LogLevel>,
    env: &E,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_max_level(resolve_level(cli_level, env))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
}

fn parse_level_str(value: &str) -> Option<Level> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("warning") {
        return Some(Level::WARN);
    }
    value.parse().ok()
}
