//! Inputs file resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

/// Discovered inputs file path.
#[derive(Debug, Clone, Default)]
pub struct InputsPath {
    /// Path to clinical.json (or None to use built-in defaults).
    pub path: Option<PathBuf>,

    /// Where the path came from (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/markov-calibrate/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_INPUTS_PATH: &str = "MARKOV_CALIBRATE_INPUTS";
pub const ENV_CONFIG_DIR: &str = "MARKOV_CALIBRATE_CONFIG_DIR";

/// Standard inputs file name.
pub const INPUTS_FILENAME: &str = "clinical.json";

/// Application name for XDG directories.
const APP_NAME: &str = "markov-calibrate";

/// Resolve the inputs file using the standard resolution order.
///
/// 1. Explicit CLI path (returned even if missing, so loading reports it)
/// 2. `MARKOV_CALIBRATE_INPUTS`
/// 3. `cli_config_dir` + clinical.json
/// 4. `MARKOV_CALIBRATE_CONFIG_DIR` + clinical.json
/// 5. XDG config directory (~/.config/markov-calibrate/)
/// 6. System config (/etc/markov-calibrate/)
/// 7. Built-in defaults (None)
pub fn resolve_inputs(cli_path: Option<&Path>, cli_config_dir: Option<&Path>) -> InputsPath {
    // 1. CLI argument
    if let Some(path) = cli_path {
        return InputsPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_INPUTS_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    // 3. CLI config dir
    if let Some(dir) = cli_config_dir {
        let path = dir.join(INPUTS_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::CliArgument);
        }
    }

    // 4. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(INPUTS_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    // 5. XDG config directory
    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(INPUTS_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::XdgConfig);
        }
    }

    // 6. System config
    let system_path = system_config_dir().join(INPUTS_FILENAME);
    if system_path.exists() {
        return found(system_path, ConfigSource::SystemConfig);
    }

    InputsPath::default()
}

fn found(path: PathBuf, source: ConfigSource) -> InputsPath {
    InputsPath {
        path: Some(path),
        source,
    }
}

/// Get the XDG config directory for markov-calibrate.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
