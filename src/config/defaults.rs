//! Default configuration constants.
//!
//! Callers share these constants instead of duplicating literals.

/// Troubleshooting image used when neither flags nor config name one.
pub const DEFAULT_IMAGE: &str = "nicolaka/netshoot:latest";
/// Well-known port the node-local debug agent listens on.
pub const DEFAULT_AGENT_PORT: u16 = 10027;
/// Command run in the debug container when none is given.
pub const DEFAULT_COMMAND: &[&str] = &["bash"];
/// Defaults file location relative to the user's home directory.
pub const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".kube/debug-config";
/// Upper bound on connecting to and upgrading the agent connection.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Interval between terminal-size samples while in raw mode.
pub const DEFAULT_RESIZE_POLL_MILLIS: u64 = 250;

/// Owned copy of [`DEFAULT_COMMAND`].
pub(crate) fn default_command() -> Vec<String> {
    DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect()
}
