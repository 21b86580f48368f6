//! Configuration loading from the debug defaults file and environment.
//!
//! Values are merged in this order of precedence (highest wins):
//! 1. CLI flags (`--image`, `--port`, trailing command)
//! 2. Environment variables (`KUBECTL_DEBUG_IMAGE`, `KUBECTL_DEBUG_AGENT_PORT`)
//! 3. YAML defaults file: `--debug-config`, `KUBECTL_DEBUG_CONFIG`, or
//!    `~/.kube/debug-config`
//! 4. Built-in defaults

use serde::Deserialize;

mod defaults;
mod env;
mod loader;
mod options;
mod sources;

pub use defaults::{
    DEFAULT_AGENT_PORT, DEFAULT_COMMAND, DEFAULT_CONFIG_RELATIVE_PATH,
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_IMAGE, DEFAULT_RESIZE_POLL_MILLIS,
};
pub use env::{AGENT_PORT_ENV, CONFIG_PATH_ENV, IMAGE_ENV};
pub use loader::load_file_config;
pub use options::{CliOverrides, SessionOptions};
pub use sources::ConfigSource;

/// Shape of the YAML defaults file.
///
/// ```yaml
/// agent_port: 10027
/// image: nicolaka/netshoot:latest
/// command:
///   - bash
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub agent_port: Option<u16>,
    pub image: Option<String>,
    pub command: Vec<String>,
    pub connect_timeout_secs: Option<u64>,
}

/// Non-fatal findings surfaced to the operator after loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    pub warnings: Vec<String>,
}

/// Result of [`load_file_config`].
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub file: FileConfig,
    pub source: ConfigSource,
    pub diagnostics: ConfigDiagnostics,
}
