//! In-memory container engine double shared by integration tests.
//!
//! [`FakeEngine`] answers `container inspect` calls from a queue of statuses
//! and hands out a single scripted event feed. Once the status queue is down
//! to one entry, that entry is repeated. The status `missing` answers with a
//! "No such object" failure.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dockside::engine::{
    CommandRequest, CommandResult, EventFeed, FinishFuture, InvokeFuture, NextLineFuture,
    ProcessInvoker, SIGNAL_TERMINATION_EXIT_CODE,
};
use dockside::error::CommandError;

/// Id every fake container reports.
pub const CONTAINER_ID: &str = "abc123";

/// Render one `events --format {{json .}}` line.
pub fn event_line(action: &str, id: &str) -> String {
    format!(
        r#"{{"status":"{action}","id":"{id}","Type":"container","Action":"{action}","Actor":{{"ID":"{id}"}}}}"#
    )
}

/// Counters shared between the engine double and the scenario.
#[derive(Debug, Clone, Default)]
pub struct FeedCounters {
    opened: Arc<AtomicUsize>,
    delivered: Arc<AtomicUsize>,
    terminated: Arc<AtomicBool>,
}

impl FeedCounters {
    /// Number of event feeds started.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of lines handed to the reader.
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Whether the feed was asked to stop.
    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

/// Engine double answering inspects and serving one event feed.
#[derive(Debug)]
pub struct FakeEngine {
    statuses: Mutex<VecDeque<String>>,
    feed_lines: Mutex<Option<Vec<String>>>,
    counters: FeedCounters,
}

impl FakeEngine {
    /// Engine whose inspects report `statuses` in order.
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statuses: Mutex::new(statuses.into_iter().map(Into::into).collect()),
            feed_lines: Mutex::new(None),
            counters: FeedCounters::default(),
        }
    }

    /// Lines the event feed delivers before going quiet.
    #[must_use]
    pub fn with_feed(self, lines: Vec<String>) -> Self {
        *self
            .feed_lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(lines);
        self
    }

    /// Handle onto the feed counters.
    pub fn counters(&self) -> FeedCounters {
        self.counters.clone()
    }

    fn next_status(&self) -> String {
        let mut statuses = self.statuses.lock().unwrap_or_else(PoisonError::into_inner);
        if statuses.len() > 1 {
            return statuses.pop_front().unwrap_or_default();
        }
        statuses.front().cloned().unwrap_or_default()
    }
}

impl ProcessInvoker for FakeEngine {
    fn invoke(&self, request: &CommandRequest) -> InvokeFuture<'_> {
        let status = self.next_status();
        let result = if status == "missing" {
            CommandResult::new(
                request,
                String::new(),
                format!("Error: No such object: {CONTAINER_ID}\n"),
                1,
            )
        } else {
            CommandResult::new(
                request,
                format!(
                    r#"{{"Id":"{CONTAINER_ID}","Name":"/web","State":{{"Status":"{status}","ExitCode":0}}}}"#
                ),
                String::new(),
                0,
            )
        };
        Box::pin(async move { Ok(result) })
    }

    fn open_feed(&self, request: &CommandRequest) -> Result<Box<dyn EventFeed>, CommandError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let lines = self
            .feed_lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();
        Ok(Box::new(FakeFeed {
            request: request.clone(),
            lines: lines.into(),
            counters: self.counters.clone(),
        }))
    }
}

/// Feed that replays its lines, then stays open without output.
struct FakeFeed {
    request: CommandRequest,
    lines: VecDeque<String>,
    counters: FeedCounters,
}

impl EventFeed for FakeFeed {
    fn next_line(&mut self) -> NextLineFuture<'_> {
        if self.counters.terminated() {
            return Box::pin(async { Ok(None) });
        }
        match self.lines.pop_front() {
            Some(line) => {
                self.counters.delivered.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { Ok(Some(line)) })
            }
            None => Box::pin(std::future::pending()),
        }
    }

    fn terminate(&mut self) -> Result<(), CommandError> {
        self.counters.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn finish(&mut self) -> FinishFuture<'_> {
        let exit_code = if self.counters.terminated() {
            SIGNAL_TERMINATION_EXIT_CODE
        } else {
            0
        };
        let result = CommandResult::new(&self.request, String::new(), String::new(), exit_code);
        Box::pin(async move { Ok(result) })
    }
}
