//! Configuration system for dockside.
//!
//! This module provides the configuration structures and CLI definitions for the
//! dockside application. Configuration loading and precedence merging is handled
//! by the `ortho_config` crate. Precedence: CLI flags override environment
//! variables, which override configuration files, which override defaults.
//!
//! The configuration file is expected at `~/.config/dockside/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! binary = "docker"
//! context = "remote-prod"
//! working_dir = "/srv/app"
//!
//! [retry]
//! timeout_secs = 30
//! initial_backoff_ms = 250
//! max_backoff_ms = 2000
//!
//! [wait]
//! timeout_secs = 120
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{Cli, Commands, InspectArgs, InventoryArgs, WaitArgs, WaitManagerArgs};
pub use loader::{env_var_names, load_config};
pub use types::{AppConfig, RetrySettings, WaitSettings};
