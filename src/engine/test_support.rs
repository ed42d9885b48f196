//! Scripted process doubles shared by engine unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::command::{CommandRequest, CommandResult, SIGNAL_TERMINATION_EXIT_CODE};
use super::invoker::{EventFeed, FinishFuture, InvokeFuture, NextLineFuture, ProcessInvoker};
use crate::error::CommandError;

/// Build a finished result for `argv`.
pub(crate) fn finished(argv: &[&str], stdout: &str, stderr: &str, exit_code: i32) -> CommandResult {
    CommandResult::new(
        &CommandRequest::new(argv.iter().copied()),
        String::from(stdout),
        String::from(stderr),
        exit_code,
    )
}

/// Render one `docker events` JSON line for a container.
pub(crate) fn event_line(action: &str, id: &str) -> String {
    format!(
        r#"{{"status":"{action}","id":"{id}","Type":"container","Action":"{action}","Actor":{{"ID":"{id}","Attributes":{{"name":"web"}}}},"time":1700000000}}"#
    )
}

/// Render one `container inspect` JSON document.
pub(crate) fn inspect_json(id: &str, status: &str) -> String {
    format!(
        r#"{{"Id":"{id}","Name":"/web","State":{{"Status":"{status}","Running":false,"ExitCode":0}}}}"#
    )
}

/// Feed that replays fixed lines, then reports end of stream.
#[derive(Debug)]
pub(crate) struct ScriptedFeed {
    lines: VecDeque<String>,
    exit_code_on_eof: i32,
    terminated: Arc<AtomicBool>,
    delivered: Arc<Mutex<usize>>,
}

impl ScriptedFeed {
    pub(crate) fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            exit_code_on_eof: 0,
            terminated: Arc::new(AtomicBool::new(false)),
            delivered: Arc::new(Mutex::new(0)),
        }
    }

    pub(crate) const fn exiting_with(mut self, exit_code: i32) -> Self {
        self.exit_code_on_eof = exit_code;
        self
    }

    /// Handle reporting whether `terminate` was called.
    pub(crate) fn terminated_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.terminated)
    }

    /// Handle counting lines handed to the reader.
    pub(crate) fn delivered_counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.delivered)
    }
}

impl EventFeed for ScriptedFeed {
    fn next_line(&mut self) -> NextLineFuture<'_> {
        let next = if self.terminated.load(Ordering::SeqCst) {
            None
        } else {
            self.lines.pop_front()
        };
        if next.is_some() {
            let mut delivered = self.delivered.lock().expect("counter lock");
            *delivered += 1;
        }
        Box::pin(async move { Ok(next) })
    }

    fn terminate(&mut self) -> Result<(), CommandError> {
        self.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn finish(&mut self) -> FinishFuture<'_> {
        let exit_code = if self.terminated.load(Ordering::SeqCst) {
            SIGNAL_TERMINATION_EXIT_CODE
        } else {
            self.exit_code_on_eof
        };
        Box::pin(async move { Ok(finished(&["docker", "events"], "", "", exit_code)) })
    }
}

/// Invoker that answers buffered calls from a queue and hands out one
/// scripted feed.
///
/// Once the queue is down to one response, that response is repeated.
#[derive(Debug, Default)]
pub(crate) struct ScriptedInvoker {
    responses: Mutex<VecDeque<Result<CommandResult, CommandError>>>,
    feed: Mutex<Option<ScriptedFeed>>,
    calls: Mutex<Vec<Vec<String>>>,
    feed_requests: Mutex<Vec<Vec<String>>>,
}

impl ScriptedInvoker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, result: CommandResult) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Ok(result));
        self
    }

    pub(crate) fn fail(self, error: CommandError) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(Err(error));
        self
    }

    pub(crate) fn with_feed(self, feed: ScriptedFeed) -> Self {
        *self.feed.lock().expect("feed lock") = Some(feed);
        self
    }

    /// Argument vectors of every buffered call, in order.
    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Argument vectors of every streaming call, in order.
    pub(crate) fn feed_requests(&self) -> Vec<Vec<String>> {
        self.feed_requests.lock().expect("feed requests lock").clone()
    }

    fn next_response(&self) -> Result<CommandResult, CommandError> {
        let mut responses = self.responses.lock().expect("responses lock");
        if responses.len() > 1 {
            return responses.pop_front().expect("non-empty queue");
        }
        match responses.front() {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(error)) => Err(clone_error(error)),
            None => panic!("no scripted response left"),
        }
    }
}

impl ProcessInvoker for ScriptedInvoker {
    fn invoke(&self, request: &CommandRequest) -> InvokeFuture<'_> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(request.argv().to_vec());
        let response = self.next_response();
        Box::pin(async move { response })
    }

    fn open_feed(&self, request: &CommandRequest) -> Result<Box<dyn EventFeed>, CommandError> {
        self.feed_requests
            .lock()
            .expect("feed requests lock")
            .push(request.argv().to_vec());
        let feed = self
            .feed
            .lock()
            .expect("feed lock")
            .take()
            .expect("a scripted feed should be configured");
        Ok(Box::new(feed))
    }
}

fn clone_error(error: &CommandError) -> CommandError {
    match error {
        CommandError::NotFound { subject } => CommandError::NotFound {
            subject: subject.clone(),
        },
        CommandError::Transient { signature, message } => CommandError::Transient {
            signature: *signature,
            message: message.clone(),
        },
        other => CommandError::MalformedOutput {
            message: other.to_string(),
        },
    }
}
