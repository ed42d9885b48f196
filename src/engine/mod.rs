//! Command execution core for the container engine executable.
//!
//! The layers, leaves first:
//!
//! 1. [`ProcessInvoker`] starts one process per call and captures a
//!    [`CommandResult`], or streams stdout through an [`EventFeed`].
//! 2. The classifier matches stderr against [`FailureSignature`] tables and
//!    builds typed errors.
//! 3. [`RetryExecutor`] re-runs transient failures until a [`Deadline`].
//! 4. [`wait_for_event`] watches a live event feed with an [`EventMatcher`].
//! 5. [`StatusWaiter`] maps a target [`ContainerStatus`] onto events and
//!    reconciles them against fresh snapshots.
//!
//! [`DockerCli`] ties the layers together. The execution context is resolved
//! by [`ContextResolver`] and carried in [`ClientConfig`]; there is no
//! process-wide state.

pub mod classify;
mod client;
mod command;
mod context;
mod events;
mod invoker;
mod retry;
mod status;

#[cfg(test)]
pub(crate) mod test_support;

pub use classify::{Classification, ErrorKind, FailureSignature, SignatureTable};
pub use client::{
    ClientConfig, DEFAULT_BINARY, DockerCli, Inventory, InventoryItem, ObjectKind, SwarmInfo,
    parse_json_lines,
};
pub use command::{CommandRequest, CommandResult, SIGNAL_TERMINATION_EXIT_CODE};
pub use context::ContextResolver;
pub use events::{EventMatcher, EventRecord, FnMatcher, MatchFuture, wait_for_event};
pub use invoker::{
    ChildFeed, EventFeed, FinishFuture, InvokeFuture, NextLineFuture, ProcessInvoker,
    SystemInvoker,
};
pub use retry::{Deadline, RetryExecutor, RetryPolicy};
pub use status::{
    ContainerSnapshot, ContainerStatus, EventPattern, Observation, SnapshotFuture,
    SnapshotSource, StatusWaiter, WaitSpec, events_arguments,
};
