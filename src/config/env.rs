//! Environment overrides layered between the defaults file and CLI flags.

use crate::error::ConfigError;

use super::FileConfig;

/// Path of the defaults file when `--debug-config` is not given.
pub const CONFIG_PATH_ENV: &str = "KUBECTL_DEBUG_CONFIG";
/// Debug image override.
pub const IMAGE_ENV: &str = "KUBECTL_DEBUG_IMAGE";
/// Agent port override.
pub const AGENT_PORT_ENV: &str = "KUBECTL_DEBUG_AGENT_PORT";

/// Apply `KUBECTL_DEBUG_*` overrides on top of the file layer.
pub(super) fn apply_env_overrides<FEnv>(
    file: &mut FileConfig,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(image) = non_empty(env_lookup(IMAGE_ENV)) {
        file.image = Some(image);
    }
    if let Some(port) = non_empty(env_lookup(AGENT_PORT_ENV)) {
        let parsed = port.parse::<u16>().ok().filter(|p| *p > 0).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "invalid {AGENT_PORT_ENV} value `{port}`: expected a port between 1 and 65535"
            ))
        })?;
        file.agent_port = Some(parsed);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
