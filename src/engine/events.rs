//! Waiting on a live, line-delimited JSON event feed.
//!
//! [`wait_for_event`] starts one long-running process, parses each stdout
//! line into an [`EventRecord`], and hands records to an [`EventMatcher`] in
//! emission order. Once the matcher is satisfied the process is sent a
//! termination signal; the resulting signal exit is the expected way for the
//! feed to end and is reported as success.

use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::classify::{NO_SIGNATURES, SignatureTable, classify};
use super::command::{CommandRequest, CommandResult};
use super::invoker::{EventFeed, ProcessInvoker};
use crate::error::CommandError;

/// Boxed future returned by [`EventMatcher`] callbacks.
pub type MatchFuture<'a> = Pin<Box<dyn Future<Output = Result<bool, CommandError>> + Send + 'a>>;

static FEED_SIGNATURES: LazyLock<SignatureTable> =
    LazyLock::new(|| SignatureTable::compile(NO_SIGNATURES));

/// One parsed line of the event feed.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    resource_id: String,
    event_name: String,
    raw: Value,
}

impl EventRecord {
    /// Parse one JSON event line.
    ///
    /// The event name is taken from `Action`, falling back to `status`;
    /// qualifiers after a colon (`health_status: healthy`) are dropped. The
    /// resource id is taken from `Actor.ID`, falling back to `id`.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::MalformedOutput` when the line is not a JSON
    /// object or carries no event name.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let raw: Value =
            serde_json::from_str(line).map_err(|error| CommandError::MalformedOutput {
                message: format!("event line is not JSON: {error}"),
            })?;
        if !raw.is_object() {
            return Err(CommandError::MalformedOutput {
                message: String::from("event line is not a JSON object"),
            });
        }

        let event_name = string_field(&raw, &["Action"])
            .or_else(|| string_field(&raw, &["status"]))
            .map(|name| name.split(':').next().unwrap_or(name).trim())
            .filter(|name| !name.is_empty())
            .map(String::from)
            .ok_or_else(|| CommandError::MalformedOutput {
                message: String::from("event line has no action"),
            })?;
        let resource_id = string_field(&raw, &["Actor", "ID"])
            .or_else(|| string_field(&raw, &["id"]))
            .map(String::from)
            .unwrap_or_default();

        Ok(Self {
            resource_id,
            event_name,
            raw,
        })
    }

    /// Create a record directly from its parts.
    #[must_use]
    pub fn new(resource_id: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            event_name: event_name.into(),
            raw: Value::Null,
        }
    }

    /// Identifier of the resource the event concerns.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Event name, e.g. `start` or `die`.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// The complete decoded line.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }
}

fn string_field<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |current, key| current.get(key))
        .and_then(Value::as_str)
}

/// Decides when an event wait is complete.
pub trait EventMatcher: Send {
    /// Called once the feed process is running, before any line is read.
    ///
    /// Returning `true` resolves the wait without reading the feed.
    fn on_attached(&mut self) -> MatchFuture<'_> {
        Box::pin(async { Ok(false) })
    }

    /// Called for every parsed record, in emission order.
    fn on_event<'a>(&'a mut self, record: &'a EventRecord) -> MatchFuture<'a>;
}

/// Adapts a synchronous predicate into an [`EventMatcher`].
#[derive(Debug, Clone)]
pub struct FnMatcher<F>(pub F);

impl<F> EventMatcher for FnMatcher<F>
where
    F: FnMut(&EventRecord) -> bool + Send,
{
    fn on_event<'a>(&'a mut self, record: &'a EventRecord) -> MatchFuture<'a> {
        let matched = (self.0)(record);
        Box::pin(async move { Ok(matched) })
    }
}

/// Run `request` as an event feed until `matcher` is satisfied.
///
/// Lines that cannot be parsed are logged and skipped. Dropping the returned
/// future kills the feed process.
///
/// # Errors
///
/// Returns `CommandError::StreamEnded` when the feed closes cleanly before the
/// matcher is satisfied, a classified error when it exits with a failure, and
/// any error raised by the matcher itself.
pub async fn wait_for_event<I>(
    invoker: &I,
    request: &CommandRequest,
    matcher: &mut dyn EventMatcher,
) -> Result<CommandResult, CommandError>
where
    I: ProcessInvoker + ?Sized,
{
    let mut feed = invoker.open_feed(request)?;

    match watch(feed.as_mut(), matcher).await {
        Ok(true) => {
            feed.terminate()?;
            let result = feed.finish().await?;
            if !(result.success() || result.terminated_by_signal()) {
                debug!(
                    exit_code = result.exit_code(),
                    "event feed exited unusually after the match"
                );
            }
            info!(command = %request.argv().join(" "), "awaited event observed");
            Ok(result)
        }
        Ok(false) => {
            let result = feed.finish().await?;
            if result.success() || result.terminated_by_signal() {
                Err(CommandError::StreamEnded {
                    result: Box::new(result),
                })
            } else {
                Err(classify(&result, &FEED_SIGNATURES))
            }
        }
        Err(error) => {
            if let Err(terminate_error) = feed.terminate() {
                debug!(error = %terminate_error, "could not stop event feed");
            }
            Err(error)
        }
    }
}

async fn watch(
    feed: &mut dyn EventFeed,
    matcher: &mut dyn EventMatcher,
) -> Result<bool, CommandError> {
    if matcher.on_attached().await? {
        return Ok(true);
    }

    while let Some(line) = feed.next_line().await? {
        let record = match EventRecord::parse(&line) {
            Ok(record) => record,
            Err(error) => {
                warn!(error = %error, "skipping malformed event line");
                continue;
            }
        };
        debug!(
            resource_id = record.resource_id(),
            event = record.event_name(),
            "event received"
        );
        if matcher.on_event(&record).await? {
            return Ok(true);
        }
    }

    Ok(false)
}
