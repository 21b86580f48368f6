//! Cluster access: kubeconfig loading, pod-status lookup, and the transport
//! credentials derived from the active context.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use secrecy::ExposeSecret;

use crate::error::DebugError;
use crate::transport::TransportConfig;
use crate::types::{ContainerStatus, PodPhase, PodStatus};

/// Source of pod status snapshots.
#[async_trait]
pub trait PodLookup: Send + Sync {
    async fn pod_status(&self, namespace: &str, name: &str) -> Result<PodStatus, DebugError>;
}

/// Pod lookup backed by the cluster API.
#[derive(Clone)]
pub struct KubePodLookup {
    client: Client,
}

impl KubePodLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PodLookup for KubePodLookup {
    async fn pod_status(&self, namespace: &str, name: &str) -> Result<PodStatus, DebugError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods.get(name).await.map_err(|e| {
            DebugError::Cluster(format!("failed to get pod {namespace}/{name}: {e}"))
        })?;
        let status = pod_status_from(&pod);
        tracing::debug!(
            pod = %status.name,
            phase = %status.phase,
            host = status.host_address.as_deref().unwrap_or("-"),
            containers = status.container_count(),
            "fetched pod status"
        );
        Ok(status)
    }
}

/// Project a cluster pod object onto the fields resolution needs.
pub fn pod_status_from(pod: &Pod) -> PodStatus {
    let status = pod.status.as_ref();
    PodStatus {
        name: pod.metadata.name.clone().unwrap_or_default(),
        phase: status
            .and_then(|s| s.phase.as_deref())
            .map(PodPhase::parse)
            .unwrap_or_default(),
        host_address: status.and_then(|s| s.host_ip.clone()),
        declared_containers: pod
            .spec
            .as_ref()
            .map(|spec| spec.containers.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default(),
        container_statuses: status
            .and_then(|s| s.container_statuses.as_ref())
            .map(|statuses| {
                statuses
                    .iter()
                    .map(|c| ContainerStatus {
                        name: c.name.clone(),
                        ready: c.ready,
                        container_id: c.container_id.clone().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Which kubeconfig and context to use.
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

/// Everything derived from the active kubeconfig context.
pub struct ClusterConnection {
    pub client: Client,
    pub default_namespace: String,
    bearer_token: Option<String>,
}

impl ClusterConnection {
    /// Load credentials and build a client. No request is sent yet.
    pub async fn connect(options: &ClusterOptions) -> Result<Self, DebugError> {
        let config = load_kube_config(options).await?;
        let default_namespace = config.default_namespace.clone();
        let bearer_token = config
            .auth_info
            .token
            .as_ref()
            .map(|token| token.expose_secret().to_string());
        let client = Client::try_from(config)?;
        tracing::debug!(namespace = %default_namespace, "loaded cluster credentials");
        Ok(Self {
            client,
            default_namespace,
            bearer_token,
        })
    }

    /// Transport parameters for reaching the agent with these credentials.
    pub fn transport_config(&self, connect_timeout: Duration) -> TransportConfig {
        TransportConfig {
            connect_timeout,
            bearer_token: self.bearer_token.clone(),
        }
    }
}

async fn load_kube_config(options: &ClusterOptions) -> Result<Config, DebugError> {
    if options.kubeconfig.is_none() && options.context.is_none() {
        return Config::infer()
            .await
            .map_err(|e| DebugError::Cluster(format!("failed to load cluster config: {e}")));
    }

    let kube_options = KubeConfigOptions {
        context: options.context.clone(),
        ..KubeConfigOptions::default()
    };
    let config = match &options.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                DebugError::Cluster(format!("failed to read kubeconfig {}: {e}", path.display()))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &kube_options).await
        }
        None => Config::from_kubeconfig(&kube_options).await,
    };
    config.map_err(|e| DebugError::Cluster(format!("failed to load kubeconfig: {e}")))
}
