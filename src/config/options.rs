//! Session options: CLI values merged over the defaults layer.
//!
//! All defaulting happens in [`SessionOptions::resolve`]; everything
//! downstream receives fully populated values.

use std::time::Duration;

use crate::error::DebugError;

use super::defaults::{
    default_command, DEFAULT_AGENT_PORT, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_IMAGE,
    DEFAULT_RESIZE_POLL_MILLIS,
};
use super::FileConfig;

/// Values taken from the command line, before defaulting.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub pod: Option<String>,
    pub namespace: Option<String>,
    pub container: Option<String>,
    pub image: Option<String>,
    pub agent_port: Option<u16>,
    pub command: Vec<String>,
}

const USAGE_HINT: &str = "kubectl-debug POD [-c CONTAINER] -- COMMAND [args...]";

impl CliOverrides {
    /// The pod name, or a usage error when it is missing or blank.
    ///
    /// Checked before any cluster configuration is loaded.
    pub fn require_pod(&self) -> Result<&str, DebugError> {
        match self.pod.as_deref().map(str::trim) {
            Some(pod) if !pod.is_empty() => Ok(pod),
            _ => Err(DebugError::Usage(format!(
                "pod not specified: usage is `{USAGE_HINT}`"
            ))),
        }
    }
}

/// Fully resolved parameters of one debug invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub namespace: String,
    pub pod_name: String,
    /// Target container; `None` selects the pod's first container.
    pub container_name: Option<String>,
    pub image: String,
    pub command: Vec<String>,
    pub agent_port: u16,
    pub connect_timeout: Duration,
    pub resize_poll_interval: Duration,
}

impl SessionOptions {
    /// Merge CLI values over the defaults layer and validate the result.
    ///
    /// `default_namespace` comes from the active kubeconfig context.
    pub fn resolve(
        cli: CliOverrides,
        file: &FileConfig,
        default_namespace: &str,
    ) -> Result<Self, DebugError> {
        let pod_name = cli.require_pod()?.to_string();

        let command = if !cli.command.is_empty() {
            cli.command
        } else if !file.command.is_empty() {
            file.command.clone()
        } else {
            default_command()
        };

        let image = non_empty(cli.image)
            .or_else(|| non_empty(file.image.clone()))
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string());

        let agent_port = cli
            .agent_port
            .filter(|p| *p > 0)
            .or(file.agent_port.filter(|p| *p > 0))
            .unwrap_or(DEFAULT_AGENT_PORT);

        let connect_timeout_secs = file
            .connect_timeout_secs
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS)
            .max(1);

        let options = Self {
            namespace: non_empty(cli.namespace).unwrap_or_else(|| default_namespace.to_string()),
            pod_name,
            container_name: non_empty(cli.container),
            image,
            command,
            agent_port,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            resize_poll_interval: Duration::from_millis(DEFAULT_RESIZE_POLL_MILLIS),
        };
        options.validate()?;
        Ok(options)
    }

    /// Check the invariants every session relies on.
    pub fn validate(&self) -> Result<(), DebugError> {
        if self.pod_name.trim().is_empty() {
            return Err(DebugError::Usage("pod name must be specified".into()));
        }
        if self.command.is_empty() {
            return Err(DebugError::Usage(
                "you must specify at least one command for the container".into(),
            ));
        }
        if self.namespace.trim().is_empty() {
            return Err(DebugError::Usage("namespace must not be empty".into()));
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
