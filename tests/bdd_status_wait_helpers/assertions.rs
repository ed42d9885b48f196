//! Assertion helpers for status wait behavioural tests.

use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{StatusWaitState, WaitOutcome};
use crate::support::FeedCounters;

fn outcome(status_wait_state: &StatusWaitState) -> StepResult<WaitOutcome> {
    status_wait_state
        .outcome
        .get()
        .ok_or_else(|| String::from("outcome should be set"))
}

fn counters(status_wait_state: &StatusWaitState) -> StepResult<FeedCounters> {
    status_wait_state
        .counters
        .get()
        .ok_or_else(|| String::from("feed counters should be set"))
}

#[then("the wait succeeds")]
fn wait_succeeds(status_wait_state: &StatusWaitState) -> StepResult<()> {
    match outcome(status_wait_state)? {
        WaitOutcome::Reached(_) => Ok(()),
        other => Err(format!("expected success, got {other:?}")),
    }
}

#[then("the wait returns status {expected}")]
fn wait_returns_status(status_wait_state: &StatusWaitState, expected: String) -> StepResult<()> {
    match outcome(status_wait_state)? {
        WaitOutcome::Reached(snapshot) if snapshot.status.as_str() == expected => Ok(()),
        WaitOutcome::Reached(snapshot) => Err(format!(
            "expected status {expected}, got {}",
            snapshot.status
        )),
        other => Err(format!("expected status {expected}, got {other:?}")),
    }
}

#[then("the wait fails as not found")]
fn wait_fails_not_found(status_wait_state: &StatusWaitState) -> StepResult<()> {
    match outcome(status_wait_state)? {
        WaitOutcome::NotFound => Ok(()),
        other => Err(format!("expected NotFound, got {other:?}")),
    }
}

#[then("the wait fails with a timeout")]
fn wait_fails_timeout(status_wait_state: &StatusWaitState) -> StepResult<()> {
    match outcome(status_wait_state)? {
        WaitOutcome::TimedOut => Ok(()),
        other => Err(format!("expected Timeout, got {other:?}")),
    }
}

#[then("no event feed was opened")]
fn no_feed_opened(status_wait_state: &StatusWaitState) -> StepResult<()> {
    let opened = counters(status_wait_state)?.opened();
    if opened == 0 {
        Ok(())
    } else {
        Err(format!("expected no feed, {opened} opened"))
    }
}

#[then("one event feed was opened")]
fn one_feed_opened(status_wait_state: &StatusWaitState) -> StepResult<()> {
    let opened = counters(status_wait_state)?.opened();
    if opened == 1 {
        Ok(())
    } else {
        Err(format!("expected one feed, {opened} opened"))
    }
}

#[then("the event feed was terminated")]
fn feed_terminated(status_wait_state: &StatusWaitState) -> StepResult<()> {
    if counters(status_wait_state)?.terminated() {
        Ok(())
    } else {
        Err(String::from("expected the feed to be terminated"))
    }
}

#[then("{count} feed lines were read")]
fn feed_lines_read(status_wait_state: &StatusWaitState, count: usize) -> StepResult<()> {
    let delivered = counters(status_wait_state)?.delivered();
    if delivered == count {
        Ok(())
    } else {
        Err(format!("expected {count} lines read, got {delivered}"))
    }
}
