//! Orchestration API for dockside commands.
//!
//! Each subcommand has a library-facing function here: [`inspect`],
//! [`wait_for_status`], [`inventory`] and [`wait_for_swarm_manager`]. They
//! accept library-owned types (not clap types), block on the supplied runtime
//! handle, and return [`crate::error::Result`]. They never print or exit, so
//! the CLI adapter and embedders share one code path.

mod operations;

pub use operations::{
    WaitParams, connect, inspect, inventory, wait_for_status, wait_for_swarm_manager,
};
