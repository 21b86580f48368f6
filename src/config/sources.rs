//! Defaults-file source discovery.
//!
//! Source order: explicit `--debug-config` path > `KUBECTL_DEBUG_CONFIG` >
//! `~/.kube/debug-config` > built-in defaults.

use std::path::{Path, PathBuf};

use super::defaults::DEFAULT_CONFIG_RELATIVE_PATH;
use super::env::CONFIG_PATH_ENV;
use super::ConfigDiagnostics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// File named by `--debug-config`.
    Explicit(PathBuf),
    /// File named by the `KUBECTL_DEBUG_CONFIG` environment variable.
    Env(PathBuf),
    /// `~/.kube/debug-config`.
    Home(PathBuf),
    /// No readable file; built-in defaults apply.
    BuiltInDefaults,
}

type SourceCtor = fn(PathBuf) -> ConfigSource;

/// Read defaults-file text from the highest-precedence available source.
///
/// A named file (flag or env) that cannot be read is reported as a warning;
/// a missing home-directory file is the normal case and stays silent.
pub(super) fn read_config_text_with_sources<FRead, FEnv, FHome>(
    path_override: Option<&str>,
    read_file: &FRead,
    env_lookup: &FEnv,
    home_dir: &FHome,
    diagnostics: &mut ConfigDiagnostics,
) -> (Option<String>, ConfigSource)
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FHome: Fn() -> Option<PathBuf>,
{
    let named: Option<(PathBuf, SourceCtor)> = match path_override.filter(|p| !p.trim().is_empty())
    {
        Some(p) => Some((PathBuf::from(p), ConfigSource::Explicit as SourceCtor)),
        None => env_lookup(CONFIG_PATH_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(|p| (PathBuf::from(p), ConfigSource::Env as SourceCtor)),
    };

    if let Some((path, source)) = named {
        return match read_file(&path) {
            Ok(text) => (Some(text), source(path)),
            Err(e) => {
                diagnostics.warnings.push(format!(
                    "failed to load debug config `{}`: {e}; using built-in defaults",
                    path.display()
                ));
                (None, ConfigSource::BuiltInDefaults)
            }
        };
    }

    if let Some(home) = home_dir() {
        let path = home.join(DEFAULT_CONFIG_RELATIVE_PATH);
        if let Ok(text) = read_file(&path) {
            return (Some(text), ConfigSource::Home(path));
        }
    }

    (None, ConfigSource::BuiltInDefaults)
}
