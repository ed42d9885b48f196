//! Given/when steps for status wait scenarios.

use std::time::Duration;

use clap::ValueEnum;
use dockside::engine::{ClientConfig, ContainerStatus, Deadline, DockerCli};
use dockside::error::CommandError;
use rstest_bdd_macros::{given, when};

use super::StepResult;
use super::state::{StatusWaitState, WaitOutcome};
use crate::support::{FakeEngine, event_line};

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}

#[given("the engine reports statuses {statuses}")]
fn given_statuses(status_wait_state: &StatusWaitState, statuses: String) {
    status_wait_state
        .statuses
        .set(split_list(&statuses).map(String::from).collect());
}

/// Each entry reads `<action> for <container id>`.
#[given("the event feed delivers {events}")]
fn given_feed_events(status_wait_state: &StatusWaitState, events: String) -> StepResult<()> {
    let lines = split_list(&events)
        .map(|entry| {
            entry
                .split_once(" for ")
                .map(|(action, id)| event_line(action.trim(), id.trim()))
                .ok_or_else(|| format!("malformed event entry '{entry}'"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    status_wait_state.feed_lines.set(lines);
    Ok(())
}

#[given("the event feed stays silent")]
fn given_silent_feed(status_wait_state: &StatusWaitState) {
    status_wait_state.feed_lines.set(Vec::new());
}

#[when("the client waits for {container} to become {status}")]
fn when_client_waits(
    status_wait_state: &StatusWaitState,
    container: String,
    status: String,
) -> StepResult<()> {
    let target = ContainerStatus::from_str(&status, true)?;
    let statuses = status_wait_state
        .statuses
        .get()
        .ok_or_else(|| String::from("statuses should be configured"))?;
    let feed_lines = status_wait_state.feed_lines.get().unwrap_or_default();

    let engine = FakeEngine::new(statuses).with_feed(feed_lines);
    status_wait_state.counters.set(engine.counters());
    let client = DockerCli::with_invoker(engine, ClientConfig::default());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .map_err(|e| format!("failed to create runtime: {e}"))?;
    let waited = runtime.block_on(async {
        client
            .wait_for_status(&container, target, Deadline::after(Duration::from_secs(30)))
            .await
    });

    let outcome = match waited {
        Ok(snapshot) => WaitOutcome::Reached(snapshot),
        Err(CommandError::NotFound { .. }) => WaitOutcome::NotFound,
        Err(CommandError::Timeout { .. }) => WaitOutcome::TimedOut,
        Err(other) => WaitOutcome::Failed(other.to_string()),
    };
    status_wait_state.outcome.set(outcome);
    Ok(())
}
