//! Typed driver for the container engine command-line executable.
//!
//! `dockside` runs the engine's CLI as a child process for every operation,
//! classifies failures from stderr into a typed taxonomy, retries transient
//! failures under a deadline, and watches the live event stream to wait for
//! container lifecycle transitions.
//!
//! # Modules
//!
//! - [`api`]: Blocking orchestration functions shared by the CLI and embedders
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`engine`]: Process invocation, classification, retry, events and status waits
//! - [`error`]: Semantic error types for the application
//! - [`logging`]: `tracing` subscriber setup

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
