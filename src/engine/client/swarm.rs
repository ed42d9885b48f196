//! Swarm membership polling.

use serde::Deserialize;
use tracing::info;

use super::{DockerCli, parse_json_lines};
use crate::engine::invoker::ProcessInvoker;
use crate::engine::retry::Deadline;
use crate::error::CommandError;

/// Signature name used when the node has not yet become a manager.
const NOT_YET_MANAGER: &str = "swarm-not-manager";

/// Swarm membership as reported by `info`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SwarmInfo {
    /// This node's id; empty when outside a swarm.
    #[serde(rename = "NodeID", default)]
    pub node_id: String,
    /// `inactive`, `pending`, `active`, `error`, or `locked`.
    #[serde(default)]
    pub local_node_state: String,
    /// Whether this node can accept swarm management requests.
    #[serde(default)]
    pub control_available: bool,
}

impl<I> DockerCli<I>
where
    I: ProcessInvoker + Sync,
{
    /// Poll until this node is an active swarm manager.
    ///
    /// A node that is not yet a manager is treated as a transient condition,
    /// so polling continues until `deadline`.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Timeout` if the node never becomes a manager.
    pub async fn wait_for_swarm_manager(
        &self,
        deadline: Option<Deadline>,
    ) -> Result<SwarmInfo, CommandError> {
        let request = self.request(["info", "--format", "{{json .Swarm}}"]);
        let info = self
            .retry_executor()
            .run("waiting for swarm manager", deadline, |_| {
                let request_ref = &request;
                async move {
                    let result = self.run(request_ref, &self.tables.swarm).await?;
                    let mut reports: Vec<SwarmInfo> = parse_json_lines(result.stdout())?;
                    let report = reports.pop().ok_or_else(|| CommandError::MalformedOutput {
                        message: String::from("info returned no swarm section"),
                    })?;
                    if report.control_available && report.local_node_state == "active" {
                        Ok(report)
                    } else {
                        Err(CommandError::Transient {
                            signature: NOT_YET_MANAGER,
                            message: format!(
                                "node state is '{}' and control is {}",
                                report.local_node_state,
                                if report.control_available { "available" } else { "unavailable" }
                            ),
                        })
                    }
                }
            })
            .await?;
        info!(node_id = %info.node_id, "node is a swarm manager");
        Ok(info)
    }
}
