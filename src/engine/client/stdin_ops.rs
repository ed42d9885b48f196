//! Operations that pass secrets on standard input.
//!
//! Payloads never appear in the argument vector, so they stay out of process
//! listings and out of the diagnostics attached to unclassified failures.

use tracing::info;

use super::DockerCli;
use crate::engine::invoker::ProcessInvoker;
use crate::engine::retry::Deadline;
use crate::error::CommandError;

impl<I> DockerCli<I>
where
    I: ProcessInvoker + Sync,
{
    /// Create a named swarm configuration object holding `payload`.
    ///
    /// Returns the new object's id. A name collision is reported as
    /// `CommandError::Conflict` and never retried, so a retry after a lost
    /// response cannot create a duplicate.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Conflict` when the name is taken,
    /// `CommandError::PreconditionFailed` when the node is not a swarm
    /// manager, and `CommandError::Timeout` when transient failures outlast
    /// `deadline`.
    pub async fn create_config(
        &self,
        name: &str,
        payload: &[u8],
        deadline: Option<Deadline>,
    ) -> Result<String, CommandError> {
        let request = self
            .request(["config", "create", name, "-"])
            .with_stdin(payload);
        let result = self
            .run_retrying("creating config", &request, &self.tables.config, deadline)
            .await?;
        let id = String::from(result.stdout().trim());
        info!(name, id = %id, "config created");
        Ok(id)
    }

    /// Log in to `registry` with a password passed on stdin.
    ///
    /// # Errors
    ///
    /// Returns the classified error when the engine rejects the credentials.
    pub async fn login(
        &self,
        registry: &str,
        username: &str,
        password: &str,
        deadline: Option<Deadline>,
    ) -> Result<(), CommandError> {
        let request = self
            .request(["login", "--username", username, "--password-stdin", registry])
            .with_stdin(password.as_bytes());
        self.run_retrying("logging in", &request, &self.tables.none, deadline)
            .await?;
        info!(registry, username, "logged in");
        Ok(())
    }
}
