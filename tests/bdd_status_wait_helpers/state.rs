//! Scenario state for status wait behavioural tests.

use dockside::engine::ContainerSnapshot;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

use crate::support::FeedCounters;

/// Outcome of a wait, reduced to what the assertions inspect.
#[derive(Debug, Clone)]
pub(crate) enum WaitOutcome {
    /// The wait resolved with this snapshot.
    Reached(ContainerSnapshot),
    /// The container went away.
    NotFound,
    /// The deadline passed.
    TimedOut,
    /// Any other failure, rendered.
    Failed(String),
}

#[derive(Default, ScenarioState)]
pub(crate) struct StatusWaitState {
    pub(crate) statuses: Slot<Vec<String>>,
    pub(crate) feed_lines: Slot<Vec<String>>,
    pub(crate) counters: Slot<FeedCounters>,
    pub(crate) outcome: Slot<WaitOutcome>,
}

#[fixture]
pub(crate) fn status_wait_state() -> StatusWaitState {
    let state = StatusWaitState::default();
    state.feed_lines.set(Vec::new());
    state
}
