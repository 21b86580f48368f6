//! Pod status snapshot consumed by target resolution.
//!
//! These are a narrow, read-only projection of the cluster's pod object so
//! the resolver can be exercised without a cluster.

use std::fmt;

/// Lifecycle phase reported by the cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[default]
    Unknown,
}

impl PodPhase {
    /// Parse the cluster's phase string; unrecognized values map to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// A terminated pod has no live namespaces to join.
    pub fn is_terminated(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Runtime state of one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    /// Opaque runtime identifier, `<runtime>://<id>`; empty until started.
    pub container_id: String,
}

/// Status of the pod being debugged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodStatus {
    pub name: String,
    pub phase: PodPhase,
    /// Address of the node running the pod; absent until scheduled.
    pub host_address: Option<String>,
    /// Container names in pod-spec order.
    pub declared_containers: Vec<String>,
    pub container_statuses: Vec<ContainerStatus>,
}

impl PodStatus {
    /// First container in declaration order, falling back to status order
    /// when the pod spec listed no containers.
    pub fn first_container(&self) -> Option<&str> {
        self.declared_containers
            .first()
            .or_else(|| self.container_statuses.first().map(|s| &s.name))
            .map(String::as_str)
    }

    /// Number of containers the pod declares.
    pub fn container_count(&self) -> usize {
        if self.declared_containers.is_empty() {
            self.container_statuses.len()
        } else {
            self.declared_containers.len()
        }
    }

    pub fn container_status(&self, name: &str) -> Option<&ContainerStatus> {
        self.container_statuses.iter().find(|s| s.name == name)
    }
}
