//! Target resolution: which running container the debug process joins.

use crate::error::DebugError;
use crate::types::PodStatus;

/// Concrete container selected for debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub container_name: String,
    /// Runtime id passed to the agent unchanged (`scheme://id`).
    pub container_id: String,
    /// Node address hosting the pod; the agent listens there.
    pub host_address: String,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub target: ResolvedTarget,
    /// Advisory for the operator, set when a default container was chosen
    /// among several.
    pub notice: Option<String>,
}

/// Pick the container to debug.
///
/// An empty `requested` name selects the first declared container.
pub fn resolve(status: &PodStatus, requested: Option<&str>) -> Result<Resolution, DebugError> {
    if status.phase.is_terminated() {
        return Err(DebugError::PodNotDebuggable {
            pod: status.name.clone(),
            reason: format!("cannot debug in a completed pod; current phase is {}", status.phase),
        });
    }

    let mut notice = None;
    let container_name = match requested.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => {
            let first = status
                .first_container()
                .ok_or_else(|| DebugError::ContainerNotFound {
                    container: format!("<default> (pod {} has no containers)", status.name),
                })?;
            if status.container_count() > 1 {
                notice = Some(format!("Defaulting container name to {first}."));
            }
            first.to_string()
        }
    };

    let container = status
        .container_status(&container_name)
        .ok_or_else(|| DebugError::ContainerNotFound {
            container: container_name.clone(),
        })?;
    if !container.ready || container.container_id.trim().is_empty() {
        return Err(DebugError::ContainerNotReady {
            container: container_name,
        });
    }

    let host_address = status
        .host_address
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DebugError::PodNotDebuggable {
            pod: status.name.clone(),
            reason: "pod is not scheduled to a node yet".into(),
        })?
        .to_string();

    Ok(Resolution {
        target: ResolvedTarget {
            container_name,
            container_id: container.container_id.clone(),
            host_address,
        },
        notice,
    })
}
