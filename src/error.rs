//! Unified error types for a debug session.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Yaml(e) => write!(f, "yaml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml(e)
    }
}

// ---------------------------------------------------------------------------
// DebugError
// ---------------------------------------------------------------------------

/// Everything that can end a debug session early.
#[derive(Debug)]
pub enum DebugError {
    /// Missing target name or empty command; raised before any network call.
    Usage(String),
    Config(ConfigError),
    /// Kubeconfig loading or pod lookup failed.
    Cluster(String),
    /// The pod's lifecycle phase (or scheduling state) rules out joining it.
    PodNotDebuggable { pod: String, reason: String },
    ContainerNotFound { container: String },
    ContainerNotReady { container: String },
    /// Connecting to or upgrading the agent connection failed.
    Transport(String),
    /// A relay channel failed mid-session.
    Stream(String),
    /// The agent reported a failure on the status channel.
    RemoteSession {
        message: String,
        exit_code: Option<i32>,
    },
}

impl DebugError {
    /// Process exit code the CLI should use for this error.
    ///
    /// Always in `1..=255`: remote codes outside that range would be
    /// truncated by the OS, possibly to 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::RemoteSession {
                exit_code: Some(code),
                ..
            } if (1..=255).contains(code) => *code,
            _ => 1,
        }
    }

    /// True when the error was raised before any agent contact.
    pub fn is_pre_connect(&self) -> bool {
        matches!(
            self,
            Self::Usage(_)
                | Self::Config(_)
                | Self::Cluster(_)
                | Self::PodNotDebuggable { .. }
                | Self::ContainerNotFound { .. }
                | Self::ContainerNotReady { .. }
        )
    }
}

impl fmt::Display for DebugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "{msg}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Cluster(msg) => write!(f, "cluster: {msg}"),
            Self::PodNotDebuggable { pod, reason } => {
                write!(f, "cannot debug pod {pod}: {reason}")
            }
            Self::ContainerNotFound { container } => {
                write!(f, "cannot find specified container {container}")
            }
            Self::ContainerNotReady { container } => write!(f, "container {container} is not ready"),
            Self::Transport(msg) => write!(f, "failed to reach debug agent: {msg}"),
            Self::Stream(msg) => write!(f, "debug session stream failed: {msg}"),
            Self::RemoteSession { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for DebugError {}

impl From<ConfigError> for DebugError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<kube::Error> for DebugError {
    fn from(e: kube::Error) -> Self {
        Self::Cluster(e.to_string())
    }
}
