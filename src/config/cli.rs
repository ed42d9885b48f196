//! Command-line argument definitions for dockside.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

use crate::engine::ContainerStatus;
use crate::logging::LogLevel;

/// Command-line interface for dockside.
#[derive(Debug, Parser)]
#[command(name = "dockside")]
#[command(
    author,
    version,
    about = "Typed driver for the container engine CLI with lifecycle waits"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Container engine executable.
    #[arg(long, global = true)]
    pub binary: Option<String>,

    /// Execution context to target.
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Log verbosity.
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print a container's current snapshot.
    Inspect(InspectArgs),

    /// Wait for a container to reach a lifecycle status.
    Wait(WaitArgs),

    /// List objects of every kind matching filters.
    Inventory(InventoryArgs),

    /// Wait for this node to become a swarm manager.
    WaitManager(WaitManagerArgs),
}

/// Arguments for the `inspect` subcommand.
#[derive(Debug, Parser)]
pub struct InspectArgs {
    /// Container id or name.
    #[arg(required = true)]
    pub container: String,
}

/// Arguments for the `wait` subcommand.
#[derive(Debug, Parser)]
pub struct WaitArgs {
    /// Container id or name.
    #[arg(required = true)]
    pub container: String,

    /// Status to wait for.
    #[arg(long, value_enum)]
    pub status: ContainerStatus,

    /// Give up after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Arguments for the `inventory` subcommand.
#[derive(Debug, Parser)]
pub struct InventoryArgs {
    /// Filter in `key=value` form; may be repeated.
    #[arg(long = "filter")]
    pub filters: Vec<String>,
}

/// Arguments for the `wait-manager` subcommand.
#[derive(Debug, Parser)]
pub struct WaitManagerArgs {
    /// Give up after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}
