//! Per-wait progress through a status transition.

use super::{ContainerStatus, EventPattern};
use crate::engine::events::EventRecord;

/// Removal always ends a wait, whatever the target.
const DESTROY_EVENT: &str = "destroy";

/// What one event meant for a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The event concerns a different container.
    Ignored,
    /// The event concerns the awaited container but made no progress.
    Observed,
    /// The event completed one step of a multi-event transition.
    Advanced,
    /// The transition is complete.
    Satisfied,
    /// The container was removed before reaching the target status.
    Vanished,
}

impl Observation {
    /// Whether the event concerned the awaited container.
    #[must_use]
    pub const fn is_relevant(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Matcher state for one status wait.
///
/// Created fresh per wait and fed every record in emission order. The
/// transition function is pure: it depends only on the current progress and
/// the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    target: ContainerStatus,
    resource_id: String,
    progress: usize,
}

impl WaitSpec {
    /// Start waiting for `resource_id` to reach `target`.
    #[must_use]
    pub fn new(target: ContainerStatus, resource_id: impl Into<String>) -> Self {
        Self {
            target,
            resource_id: resource_id.into(),
            progress: 0,
        }
    }

    /// The awaited status.
    #[must_use]
    pub const fn target(&self) -> ContainerStatus {
        self.target
    }

    /// The awaited container id.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Number of sequence steps observed so far.
    #[must_use]
    pub const fn progress(&self) -> usize {
        self.progress
    }

    /// Whether the transition has been fully observed.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.progress >= self.target.awaited_events().names().len()
    }

    /// Every event name the feed must deliver for this wait.
    #[must_use]
    pub fn event_filter(&self) -> Vec<&'static str> {
        let mut names = self.target.awaited_events().names().to_vec();
        if !names.contains(&DESTROY_EVENT) {
            names.push(DESTROY_EVENT);
        }
        names
    }

    /// Advance the state machine with one record.
    pub fn observe(&mut self, record: &EventRecord) -> Observation {
        if record.resource_id() != self.resource_id {
            return Observation::Ignored;
        }
        if self.is_satisfied() {
            return Observation::Satisfied;
        }

        let event = record.event_name();
        let names = self.target.awaited_events().names();
        let progressed = match self.target.awaited_events() {
            EventPattern::Any(_) => {
                if names.contains(&event) {
                    self.progress = names.len();
                    true
                } else {
                    false
                }
            }
            EventPattern::Sequence(_) => self.advance_sequence(names, event),
        };

        if self.is_satisfied() {
            Observation::Satisfied
        } else if event == DESTROY_EVENT {
            Observation::Vanished
        } else if progressed {
            Observation::Advanced
        } else {
            Observation::Observed
        }
    }

    fn advance_sequence(&mut self, names: &[&str], event: &str) -> bool {
        if names.get(self.progress).is_some_and(|expected| *expected == event) {
            self.progress = self.progress.saturating_add(1);
            return true;
        }
        // A repeated opening event restarts the sequence rather than
        // abandoning it.
        if names.first().is_some_and(|first| *first == event) {
            self.progress = 1;
            return true;
        }
        false
    }
}
