//! Top-level defaults loading pipeline.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::env::apply_env_overrides;
use super::sources::read_config_text_with_sources;
use super::{ConfigDiagnostics, FileConfig, LoadedConfig};

/// Load the defaults file and environment overrides.
///
/// `path_override` is the `--debug-config` flag value. A missing or
/// malformed file degrades to built-in defaults with a warning; only invalid
/// environment values are hard errors.
pub fn load_file_config(path_override: Option<&str>) -> Result<LoadedConfig, ConfigError> {
    load_file_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        dirs::home_dir,
    )
}

pub(super) fn load_file_config_from_sources<FRead, FEnv, FHome>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    home_dir: FHome,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FHome: Fn() -> Option<PathBuf>,
{
    let mut diagnostics = ConfigDiagnostics::default();
    let (text, source) = read_config_text_with_sources(
        path_override,
        &read_file,
        &env_lookup,
        &home_dir,
        &mut diagnostics,
    );

    let mut file = match text.as_deref().map(parse_file_config) {
        Some(Ok(file)) => file,
        Some(Err(e)) => {
            diagnostics
                .warnings
                .push(format!("ignoring malformed debug config: {e}"));
            FileConfig::default()
        }
        None => FileConfig::default(),
    };
    apply_env_overrides(&mut file, &env_lookup)?;
    tracing::debug!(?source, ?file, "loaded debug defaults");

    Ok(LoadedConfig {
        file,
        source,
        diagnostics,
    })
}

/// Parse YAML defaults text. Empty text yields the default (empty) layer.
pub(super) fn parse_file_config(text: &str) -> Result<FileConfig, ConfigError> {
    if text.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    Ok(serde_yaml::from_str(text)?)
}
