//! Typed client for the container engine executable.
//!
//! [`DockerCli`] turns intents into argument vectors, prefixes every vector
//! with the executable and the configured execution context, runs it through
//! a [`ProcessInvoker`], and converts the outcome into typed values or
//! classified errors. Operations that may hit transient failures run under
//! the [`RetryExecutor`].

mod inventory;
mod stdin_ops;
mod swarm;

use camino::Utf8PathBuf;
use serde::de::DeserializeOwned;
use tracing::debug;

pub use self::inventory::{Inventory, InventoryItem, ObjectKind};
pub use self::swarm::SwarmInfo;
use super::classify::{CONTAINER_SIGNATURES, NO_SIGNATURES, SignatureTable, classify};
use super::command::{CommandRequest, CommandResult};
use super::invoker::{ProcessInvoker, SystemInvoker};
use super::retry::{Deadline, RetryExecutor, RetryPolicy};
use super::status::{ContainerSnapshot, ContainerStatus, SnapshotFuture, SnapshotSource, StatusWaiter};
use crate::error::CommandError;

/// Default executable name.
pub const DEFAULT_BINARY: &str = "docker";

/// Settings shared by every operation of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Executable to run.
    pub binary: String,
    /// Execution context injected as `--context` on every invocation.
    pub context: Option<String>,
    /// Working directory for every invocation; inherited when unset.
    pub working_dir: Option<Utf8PathBuf>,
    /// Retry timing for transient failures.
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binary: String::from(DEFAULT_BINARY),
            context: None,
            working_dir: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Signature tables compiled once per client.
#[derive(Debug)]
struct Tables {
    none: SignatureTable,
    container: SignatureTable,
    config: SignatureTable,
    swarm: SignatureTable,
}

impl Tables {
    fn compile() -> Self {
        Self {
            none: SignatureTable::compile(NO_SIGNATURES),
            container: SignatureTable::compile(CONTAINER_SIGNATURES),
            config: SignatureTable::compile(super::classify::CONFIG_SIGNATURES),
            swarm: SignatureTable::compile(super::classify::SWARM_SIGNATURES),
        }
    }
}

/// Client driving the container engine executable.
#[derive(Debug)]
pub struct DockerCli<I = SystemInvoker> {
    invoker: I,
    config: ClientConfig,
    prefix: Vec<String>,
    tables: Tables,
}

impl DockerCli<SystemInvoker> {
    /// Create a client that starts real processes.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_invoker(SystemInvoker, config)
    }
}

impl<I> DockerCli<I>
where
    I: ProcessInvoker + Sync,
{
    /// Create a client using a custom invoker.
    #[must_use]
    pub fn with_invoker(invoker: I, config: ClientConfig) -> Self {
        let mut prefix = vec![config.binary.clone()];
        if let Some(context) = &config.context {
            prefix.push(String::from("--context"));
            prefix.push(context.clone());
        }
        Self {
            invoker,
            config,
            prefix,
            tables: Tables::compile(),
        }
    }

    /// Return the client settings.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Return the invoker.
    #[must_use]
    pub const fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Executable plus global flags prepended to every invocation.
    #[must_use]
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// Build a request for `args`, adding the prefix and working directory.
    #[must_use]
    pub fn request<A, S>(&self, args: A) -> CommandRequest
    where
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = CommandRequest::new(
            self.prefix
                .iter()
                .cloned()
                .chain(args.into_iter().map(Into::into)),
        );
        match &self.config.working_dir {
            Some(dir) => request.with_working_dir(dir.clone()),
            None => request,
        }
    }

    /// Return an executor using this client's retry policy.
    #[must_use]
    pub const fn retry_executor(&self) -> RetryExecutor {
        RetryExecutor::new(self.config.retry)
    }

    /// Run `request` once and classify a failure.
    ///
    /// # Errors
    ///
    /// Returns the classified error when the process exits non-zero, or a
    /// process-level error when it cannot be run.
    pub async fn run(
        &self,
        request: &CommandRequest,
        specific: &SignatureTable,
    ) -> Result<CommandResult, CommandError> {
        let result = self.invoker.invoke(request).await?;
        if result.success() {
            Ok(result)
        } else {
            Err(classify(&result, specific))
        }
    }

    /// Run `request` under the retry executor.
    ///
    /// # Errors
    ///
    /// Returns the first permanent error, or `CommandError::Timeout` when
    /// transient failures persist past `deadline`.
    pub async fn run_retrying(
        &self,
        operation: &str,
        request: &CommandRequest,
        specific: &SignatureTable,
        deadline: Option<Deadline>,
    ) -> Result<CommandResult, CommandError> {
        self.retry_executor()
            .run(operation, deadline, |_| self.run(request, specific))
            .await
    }

    /// Run `request` with retries and parse one JSON object per stdout line.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::MalformedOutput` if any line fails to parse, in
    /// addition to the errors of [`Self::run_retrying`].
    pub async fn run_json<T>(
        &self,
        operation: &str,
        request: &CommandRequest,
        specific: &SignatureTable,
        deadline: Option<Deadline>,
    ) -> Result<Vec<T>, CommandError>
    where
        T: DeserializeOwned,
    {
        let result = self
            .run_retrying(operation, request, specific, deadline)
            .await?;
        parse_json_lines(result.stdout())
    }

    /// Load a snapshot of one container.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::NotFound` when the container does not exist.
    pub async fn inspect_container(
        &self,
        container: &str,
        deadline: Option<Deadline>,
    ) -> Result<ContainerSnapshot, CommandError> {
        let request = self.request(["container", "inspect", "--format", "{{json .}}", container]);
        let snapshots: Vec<ContainerSnapshot> = self
            .run_json(
                "inspecting container",
                &request,
                &self.tables.container,
                deadline,
            )
            .await?;
        snapshots
            .into_iter()
            .next()
            .ok_or_else(|| CommandError::MalformedOutput {
                message: format!("inspect returned nothing for '{container}'"),
            })
    }

    /// Wait for `container` to reach `target` before `deadline`.
    ///
    /// # Errors
    ///
    /// See [`StatusWaiter::wait`].
    pub async fn wait_for_status(
        &self,
        container: &str,
        target: ContainerStatus,
        deadline: Deadline,
    ) -> Result<ContainerSnapshot, CommandError> {
        StatusWaiter::new(self, &self.invoker, &self.prefix)
            .wait(container, target, deadline)
            .await
    }
}

impl<I> SnapshotSource for DockerCli<I>
where
    I: ProcessInvoker + Sync,
{
    fn snapshot<'a>(&'a self, container: &'a str, deadline: Deadline) -> SnapshotFuture<'a> {
        Box::pin(self.inspect_container(container, Some(deadline)))
    }
}

/// Parse stdout holding one JSON document per line.
///
/// Blank lines are skipped.
///
/// # Errors
///
/// Returns `CommandError::MalformedOutput` naming the first bad line.
pub fn parse_json_lines<T: DeserializeOwned>(stdout: &str) -> Result<Vec<T>, CommandError> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|error| {
                debug!(line, "unparseable engine output line");
                CommandError::MalformedOutput {
                    message: format!("line {}: {error}", index.saturating_add(1)),
                }
            })
        })
        .collect()
}
