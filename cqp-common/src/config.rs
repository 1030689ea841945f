//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is TOML. The built-in table (compiled into the
//! binary) is always loaded first; at most one user file is merged over it.
//! The user file is picked in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `CQP_CONFIG` environment variable
//! 3. `<config dir>/cqp/config.toml` if it exists
//! 4. None: built-in table only

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::CatalogConfig;
use crate::{Error, Result};

/// Built-in configuration table
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "CQP_CONFIG";

/// Complete bootstrap configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CqpConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub artifacts: ArtifactConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    pub catalog: CatalogConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which artifact backend serves predictions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactBackend {
    #[default]
    Portable,
    Remote,
}

/// `[artifacts]` section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactConfig {
    #[serde(default)]
    pub backend: ArtifactBackend,

    /// Directory of portable exports
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,

    /// Inference service base URL (remote backend only)
    #[serde(default)]
    pub url: Option<String>,

    /// Inference service request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Keep loaded predictors for the lifetime of the process
    #[serde(default)]
    pub cache: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            backend: ArtifactBackend::default(),
            dir: default_artifact_dir(),
            url: None,
            timeout_secs: default_timeout_secs(),
            cache: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where the user config file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserConfigDir(PathBuf),
    BuiltIn,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::UserConfigDir(p) => Some(p),
            ConfigSource::BuiltIn => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CommandLine(p) => write!(f, "{} (command line)", p.display()),
            ConfigSource::Environment(p) => write!(f, "{} ({})", p.display(), CONFIG_ENV_VAR),
            ConfigSource::UserConfigDir(p) => write!(f, "{} (user config dir)", p.display()),
            ConfigSource::BuiltIn => f.write_str("built-in defaults"),
        }
    }
}

/// Pick the user config file following the priority order above
pub fn resolve_config_source(cli_arg: Option<&Path>) -> ConfigSource {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return ConfigSource::CommandLine(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return ConfigSource::Environment(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config directory
    if let Some(path) = user_config_file() {
        if path.exists() {
            return ConfigSource::UserConfigDir(path);
        }
    }

    // Priority 4: Built-in table only
    ConfigSource::BuiltIn
}

/// `<config dir>/cqp/config.toml` for the current platform
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cqp").join("config.toml"))
}

impl CqpConfig {
    /// Built-in configuration only
    pub fn built_in() -> Result<Self> {
        Self::from_toml_str("")
    }

    /// Built-in configuration with `overlay` (TOML text) merged over it
    pub fn from_toml_str(overlay: &str) -> Result<Self> {
        let base: toml::Table = DEFAULT_CONFIG
            .parse()
            .map_err(|e| Error::Config(format!("built-in configuration is invalid: {}", e)))?;
        let overlay: toml::Table = overlay
            .parse()
            .map_err(|e| Error::Config(format!("invalid TOML: {}", e)))?;

        let mut merged = toml::Value::Table(base);
        merge_toml(&mut merged, toml::Value::Table(overlay));

        merged
            .try_into()
            .map_err(|e: toml::de::Error| Error::Config(format!("invalid configuration: {}", e)))
    }

    /// Resolve and load the configuration
    ///
    /// A file named on the command line or in `CQP_CONFIG` must be readable;
    /// the per-user file is only used when present.
    pub fn load(cli_arg: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let source = resolve_config_source(cli_arg);

        let config = match source.path() {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read config file {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&content).map_err(|e| match e {
                    Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
                    other => other,
                })?
            }
            None => {
                warn!("No config file found, using built-in defaults");
                Self::built_in()?
            }
        };

        info!("Configuration loaded from {}", source);
        Ok((config, source))
    }
}

/// Merge `overlay` into `base`: tables recursively, everything else replaced
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
