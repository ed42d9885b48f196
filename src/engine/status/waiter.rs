//! Event-driven waiting for a container status, reconciled against snapshots.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info};

use super::{ContainerSnapshot, ContainerStatus, Observation, WaitSpec};
use crate::engine::command::CommandRequest;
use crate::engine::events::{EventMatcher, EventRecord, MatchFuture, wait_for_event};
use crate::engine::invoker::ProcessInvoker;
use crate::engine::retry::Deadline;
use crate::error::CommandError;

/// Boxed future returned by [`SnapshotSource::snapshot`].
pub type SnapshotFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ContainerSnapshot, CommandError>> + Send + 'a>>;

/// Anything that can report a container's current state.
pub trait SnapshotSource: Sync {
    /// Load a fresh snapshot of `container` (name or id), giving up at
    /// `deadline`.
    fn snapshot<'a>(&'a self, container: &'a str, deadline: Deadline) -> SnapshotFuture<'a>;
}

/// Arguments for an event feed scoped to one container and a set of events.
#[must_use]
pub fn events_arguments(resource_id: &str, events: &[&str]) -> Vec<String> {
    let mut args = vec![
        String::from("events"),
        String::from("--format"),
        String::from("{{json .}}"),
        String::from("--filter"),
        String::from("type=container"),
        String::from("--filter"),
        format!("container={resource_id}"),
    ];
    for event in events {
        args.push(String::from("--filter"));
        args.push(format!("event={event}"));
    }
    args
}

/// Waits for a container to reach a lifecycle status.
///
/// `prefix` is prepended to the event feed's arguments and normally holds the
/// executable and any global flags such as `--context`.
pub struct StatusWaiter<'a, S: ?Sized, I: ?Sized> {
    source: &'a S,
    invoker: &'a I,
    prefix: &'a [String],
}

impl<'a, S, I> StatusWaiter<'a, S, I>
where
    S: SnapshotSource + ?Sized,
    I: ProcessInvoker + ?Sized,
{
    /// Create a waiter reading snapshots from `source` and events through
    /// `invoker`.
    #[must_use]
    pub const fn new(source: &'a S, invoker: &'a I, prefix: &'a [String]) -> Self {
        Self {
            source,
            invoker,
            prefix,
        }
    }

    /// Wait until `container` reaches `target` or `deadline` passes.
    ///
    /// Returns immediately when the container already has the target status.
    /// Otherwise the event feed is watched and the snapshot reloaded on
    /// attach and on every event for the container; either source may
    /// resolve the wait. The returned snapshot is the most recent reload.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::NotFound` if the container disappears,
    /// `CommandError::Timeout` when the deadline passes, and any error from
    /// the event feed or snapshot source.
    pub async fn wait(
        &self,
        container: &str,
        target: ContainerStatus,
        deadline: Deadline,
    ) -> Result<ContainerSnapshot, CommandError> {
        // The deadline bounds the initial load as well as the feed.
        let waited =
            tokio::time::timeout_at(deadline.instant(), self.wait_within(container, target, deadline))
                .await;
        let attempts = match waited {
            Ok(Err(CommandError::Timeout { attempts, .. })) => attempts,
            Ok(outcome) => return outcome,
            Err(_elapsed) => 1,
        };
        Err(CommandError::Timeout {
            operation: format!("waiting for '{container}' to become {target}"),
            attempts,
        })
    }

    async fn wait_within(
        &self,
        container: &str,
        target: ContainerStatus,
        deadline: Deadline,
    ) -> Result<ContainerSnapshot, CommandError> {
        let initial = self.source.snapshot(container, deadline).await?;
        if initial.status == target {
            info!(container, status = %target, "container already in awaited status");
            return Ok(initial);
        }

        let spec = WaitSpec::new(target, initial.id.clone());
        let request = CommandRequest::new(
            self.prefix
                .iter()
                .cloned()
                .chain(events_arguments(&initial.id, &spec.event_filter())),
        );
        debug!(container, from = %initial.status, to = %target, "waiting for status");

        let mut matcher = StatusMatcher {
            source: self.source,
            container: initial.id.clone(),
            deadline,
            spec,
            latest: initial,
        };
        wait_for_event(self.invoker, &request, &mut matcher).await?;
        info!(container, status = %matcher.latest.status, "awaited status reached");
        Ok(matcher.latest)
    }
}

struct StatusMatcher<'a, S: ?Sized> {
    source: &'a S,
    container: String,
    deadline: Deadline,
    spec: WaitSpec,
    latest: ContainerSnapshot,
}

impl<S> StatusMatcher<'_, S>
where
    S: SnapshotSource + ?Sized,
{
    /// Reload and report whether the snapshot alone shows the target.
    async fn reload(&mut self) -> Result<bool, CommandError> {
        let snapshot = self.source.snapshot(&self.container, self.deadline).await?;
        let reached = snapshot.status == self.spec.target();
        self.latest = snapshot;
        Ok(reached)
    }

    async fn observe(&mut self, record: &EventRecord) -> Result<bool, CommandError> {
        let observation = self.spec.observe(record);
        debug!(
            container = %self.container,
            event = record.event_name(),
            ?observation,
            progress = self.spec.progress(),
            "status wait observed event"
        );

        match observation {
            Observation::Ignored => Ok(false),
            Observation::Vanished => Err(CommandError::NotFound {
                subject: self.container.clone(),
            }),
            Observation::Satisfied => match self.reload().await {
                Ok(_) => Ok(true),
                // A destroyed container cannot be reloaded; the event is
                // the final word.
                Err(CommandError::NotFound { .. })
                    if self.spec.target() == ContainerStatus::Removing =>
                {
                    self.latest.status = ContainerStatus::Removing;
                    Ok(true)
                }
                Err(error) => Err(error),
            },
            Observation::Observed | Observation::Advanced => self.reload().await,
        }
    }
}

impl<S> EventMatcher for StatusMatcher<'_, S>
where
    S: SnapshotSource + ?Sized,
{
    fn on_attached(&mut self) -> MatchFuture<'_> {
        Box::pin(self.reload())
    }

    fn on_event<'a>(&'a mut self, record: &'a EventRecord) -> MatchFuture<'a> {
        Box::pin(self.observe(record))
    }
}
