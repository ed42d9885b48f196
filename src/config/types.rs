//! Configuration data types for dockside.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::engine::{ClientConfig, ContextResolver, DEFAULT_BINARY, RetryPolicy};
use crate::error::ConfigError;

/// Retry timing for transient engine failures.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Window in seconds used when an operation is given no deadline.
    #[default = 30]
    pub timeout_secs: u64,

    /// First back-off sleep in milliseconds.
    #[default = 250]
    pub initial_backoff_ms: u64,

    /// Upper bound for any back-off sleep in milliseconds.
    #[default = 2000]
    pub max_backoff_ms: u64,
}

impl RetrySettings {
    /// Convert into the engine's retry policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            default_window: Duration::from_secs(self.timeout_secs),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// Defaults for status and manager waits started from the CLI.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct WaitSettings {
    /// Deadline in seconds for waits without an explicit `--timeout-secs`.
    #[default = 120]
    pub timeout_secs: u64,
}

/// Root application configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and command-line arguments with layered precedence. The precedence order
/// (lowest to highest) is: defaults, configuration file, environment variables,
/// command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `--config`
/// 2. Path specified via `DOCKSIDE_CONFIG_PATH` environment variable
/// 3. `.dockside.toml` in the current working directory
/// 4. `.dockside.toml` in the home directory
/// 5. `~/.config/dockside/config.toml` (XDG default)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "DOCKSIDE",
    post_merge_hook,
    discovery(
        app_name = "dockside",
        env_var = "DOCKSIDE_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".dockside.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// Container engine executable; `docker` when unset.
    pub binary: Option<String>,

    /// Execution context injected as `--context` on every invocation.
    pub context: Option<String>,

    /// Working directory for every invocation.
    #[ortho_config(skip_cli)]
    pub working_dir: Option<Utf8PathBuf>,

    /// Retry timing.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub retry: RetrySettings,

    /// Wait defaults.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub wait: WaitSettings,
}

impl AppConfig {
    /// The executable to drive.
    #[must_use]
    pub fn binary(&self) -> &str {
        self.binary.as_deref().unwrap_or(DEFAULT_BINARY)
    }

    /// Default deadline window for CLI waits.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait.timeout_secs)
    }

    /// Check cross-field constraints after merging.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when the executable name is blank
    /// or the back-off bounds are inconsistent.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.binary().trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: String::from("binary"),
                reason: String::from("must name an executable"),
            }
            .into());
        }
        if self.retry.initial_backoff_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: String::from("retry.initial_backoff_ms"),
                reason: String::from("must be greater than zero"),
            }
            .into());
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::InvalidValue {
                field: String::from("retry.initial_backoff_ms"),
                reason: format!(
                    "must not exceed retry.max_backoff_ms ({})",
                    self.retry.max_backoff_ms
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Build the client settings, resolving the execution context through
    /// `env` when configuration names none.
    #[must_use]
    pub fn client_config<E: mockable::Env>(&self, env: &E) -> ClientConfig {
        ClientConfig {
            binary: String::from(self.binary()),
            context: ContextResolver::new(env).resolve(self.context.as_deref()),
            working_dir: self.working_dir.clone(),
            retry: self.retry.policy(),
        }
    }
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        // An empty context in a file or variable means "engine default".
        if self
            .context
            .as_deref()
            .is_some_and(|context| context.trim().is_empty())
        {
            self.context = None;
        }
        Ok(())
    }
}
