//! Container lifecycle statuses and waiting for status transitions.
//!
//! The mapping from a target status to the event(s) that announce it lives in
//! one table, [`ContainerStatus::awaited_events`]. [`WaitSpec`] tracks progress
//! through that table for one container, and [`StatusWaiter`] combines it with
//! the live event feed and snapshot reloads.

mod wait_spec;
mod waiter;

use std::fmt;

use serde::Deserialize;

pub use self::wait_spec::{Observation, WaitSpec};
pub use self::waiter::{SnapshotFuture, SnapshotSource, StatusWaiter, events_arguments};

/// Lifecycle status reported by the container engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    /// Created but never started.
    Created,
    /// Running.
    Running,
    /// Paused.
    Paused,
    /// Being restarted by its restart policy.
    Restarting,
    /// Being removed.
    Removing,
    /// Stopped.
    Exited,
    /// Defunct; removal failed part way.
    Dead,
}

/// The event shape that announces a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPattern {
    /// Any one of the listed events.
    Any(&'static [&'static str]),
    /// Every listed event, in order, for the same container.
    Sequence(&'static [&'static str]),
}

impl EventPattern {
    /// Event names involved in the pattern, in table order.
    #[must_use]
    pub const fn names(&self) -> &'static [&'static str] {
        match self {
            Self::Any(names) | Self::Sequence(names) => names,
        }
    }
}

impl ContainerStatus {
    /// Events whose observation implies the container reached this status.
    #[must_use]
    pub const fn awaited_events(self) -> EventPattern {
        match self {
            Self::Created => EventPattern::Any(&["create"]),
            Self::Running => EventPattern::Any(&["start"]),
            Self::Paused => EventPattern::Any(&["pause"]),
            Self::Exited => EventPattern::Any(&["die"]),
            Self::Removing => EventPattern::Any(&["destroy"]),
            Self::Dead => EventPattern::Any(&["die", "oom"]),
            Self::Restarting => EventPattern::Sequence(&["die", "start"]),
        }
    }

    /// The engine's spelling of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time view of one container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "InspectDocument")]
pub struct ContainerSnapshot {
    /// Full container id.
    pub id: String,
    /// Container name without the leading slash.
    pub name: String,
    /// Lifecycle status.
    pub status: ContainerStatus,
    /// Exit code of the last run; zero if never exited.
    pub exit_code: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectDocument {
    id: String,
    #[serde(default)]
    name: String,
    state: InspectState,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    status: ContainerStatus,
    #[serde(default)]
    exit_code: i32,
}

impl From<InspectDocument> for ContainerSnapshot {
    fn from(document: InspectDocument) -> Self {
        Self {
            id: document.id,
            name: String::from(document.name.trim_start_matches('/')),
            status: document.state.status,
            exit_code: document.state.exit_code,
        }
    }
}
