//! Compile-time build metadata exposed to the CLI.

/// Semver package version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("KUBECTL_DEBUG_BUILD_GIT_HASH");

/// Build timestamp captured at compile time.
pub const BUILD_TIMESTAMP: &str = env!("KUBECTL_DEBUG_BUILD_TIMESTAMP");

/// Long version block used by `kubectl-debug --version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("KUBECTL_DEBUG_BUILD_GIT_HASH"),
    "\nbuilt: ",
    env!("KUBECTL_DEBUG_BUILD_TIMESTAMP")
);

/// User-Agent sent on the agent upgrade request.
pub fn user_agent() -> String {
    format!("kubectl-debug/{VERSION} ({GIT_COMMIT})")
}
