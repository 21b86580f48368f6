//! Debug request construction against the node-local agent.

use std::fmt;

use url::Url;

use crate::error::DebugError;
use crate::resolve::ResolvedTarget;

/// Versioned path the agent serves debug sessions on.
pub const DEBUG_ENDPOINT_PATH: &str = "/api/v1/debug";

/// `host:port` of the agent colocated with the pod's node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for AgentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Immutable description of one remote debug session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRequest {
    pub namespace: String,
    pub pod_name: String,
    pub container_id: String,
    pub image: String,
    pub command: Vec<String>,
    pub endpoint: AgentEndpoint,
}

impl DebugRequest {
    /// Assemble the request for a resolved target.
    pub fn build(
        namespace: &str,
        pod_name: &str,
        target: &ResolvedTarget,
        image: &str,
        command: &[String],
        agent_port: u16,
    ) -> Result<Self, DebugError> {
        if command.is_empty() {
            return Err(DebugError::Usage(
                "you must specify at least one command for the container".into(),
            ));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            pod_name: pod_name.to_string(),
            container_id: target.container_id.clone(),
            image: image.to_string(),
            command: command.to_vec(),
            endpoint: AgentEndpoint {
                host: target.host_address.clone(),
                port: agent_port,
            },
        })
    }

    /// Command vector as a JSON array; argument boundaries survive exactly.
    pub fn encoded_command(&self) -> Result<String, DebugError> {
        serde_json::to_string(&self.command)
            .map_err(|e| DebugError::Usage(format!("failed to encode command: {e}")))
    }

    /// `http://host:port/api/v1/debug?image=..&container=..&command=[..]`
    pub fn url(&self) -> Result<Url, DebugError> {
        let mut url = Url::parse(&format!("http://{}{DEBUG_ENDPOINT_PATH}", self.endpoint))
            .map_err(|e| {
                DebugError::Transport(format!("invalid agent address {}: {e}", self.endpoint))
            })?;
        let command = self.encoded_command()?;
        url.query_pairs_mut()
            .append_pair("image", &self.image)
            .append_pair("container", &self.container_id)
            .append_pair("command", &command);
        Ok(url)
    }
}
