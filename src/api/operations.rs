//! Blocking wrappers over the asynchronous [`DockerCli`] operations.

use std::time::Duration;

use tokio::runtime::Handle;

use crate::config::AppConfig;
use crate::engine::{
    ContainerSnapshot, ContainerStatus, Deadline, DockerCli, Inventory, ProcessInvoker, SwarmInfo,
};
use crate::error::Result as DocksideResult;

/// Build a client for the system executable.
///
/// The execution context comes from configuration, falling back to the
/// engine's own environment variable read through `env`.
#[must_use]
pub fn connect<E: mockable::Env>(config: &AppConfig, env: &E) -> DockerCli {
    DockerCli::new(config.client_config(env))
}

/// Fetch one container's snapshot, retrying transient failures within the
/// client's default window.
///
/// # Errors
///
/// Returns `CommandError::NotFound` for an unknown container, or whatever the
/// classifier made of the failure.
pub fn inspect<I>(
    client: &DockerCli<I>,
    runtime_handle: &Handle,
    container: &str,
) -> DocksideResult<ContainerSnapshot>
where
    I: ProcessInvoker + Sync,
{
    Ok(runtime_handle.block_on(client.inspect_container(container, None))?)
}

/// Parameters for [`wait_for_status`].
///
/// Groups the arguments into a single struct to keep the signature short.
pub struct WaitParams<'a, I> {
    /// Client driving the executable.
    pub client: &'a DockerCli<I>,
    /// Tokio runtime handle for blocking execution.
    pub runtime_handle: &'a Handle,
    /// Container id or name.
    pub container: &'a str,
    /// Status to wait for.
    pub target: ContainerStatus,
    /// How long to wait before giving up.
    pub timeout: Duration,
}

/// Block until the container reaches `target`.
///
/// The deadline starts when the wait starts on the runtime.
///
/// # Errors
///
/// Returns `CommandError::Timeout` when the deadline passes,
/// `CommandError::NotFound` if the container disappears, or any failure of
/// the initial inspect.
pub fn wait_for_status<I>(params: WaitParams<'_, I>) -> DocksideResult<ContainerSnapshot>
where
    I: ProcessInvoker + Sync,
{
    let WaitParams {
        client,
        runtime_handle,
        container,
        target,
        timeout,
    } = params;

    Ok(runtime_handle.block_on(async {
        client
            .wait_for_status(container, target, Deadline::after(timeout))
            .await
    })?)
}

/// List containers, images, networks and volumes matching `filters`.
///
/// # Errors
///
/// Fails as a whole if any single listing fails.
pub fn inventory<I>(
    client: &DockerCli<I>,
    runtime_handle: &Handle,
    filters: &[String],
) -> DocksideResult<Inventory>
where
    I: ProcessInvoker + Sync,
{
    Ok(runtime_handle.block_on(client.inventory(filters, None))?)
}

/// Block until this node is an active swarm manager.
///
/// # Errors
///
/// Returns `CommandError::Timeout` if the node is still not a manager when
/// `timeout` elapses.
pub fn wait_for_swarm_manager<I>(
    client: &DockerCli<I>,
    runtime_handle: &Handle,
    timeout: Duration,
) -> DocksideResult<SwarmInfo>
where
    I: ProcessInvoker + Sync,
{
    Ok(runtime_handle.block_on(async {
        client
            .wait_for_swarm_manager(Some(Deadline::after(timeout)))
            .await
    })?)
}
