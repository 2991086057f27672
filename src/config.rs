//! Configuration System
//!
//! Layered configuration for the speedgrader CLI. Sources, lowest to highest
//! precedence: built-in defaults, the global config file
//! (`$XDG_CONFIG_HOME/speedgrader/config.toml`), the workspace file
//! (`./speedgrader.toml`), environment variables (`SPEEDGRADER_*`, plus
//! `CANVAS_URL`/`CANVAS_API_KEY` for drop-in compatibility with older
//! tooling), and finally CLI flags applied by the binary.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeedgraderConfig {
    /// Canvas API connection settings
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// External grader process settings
    #[serde(default)]
    pub grader: GraderConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Canvas API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Canvas instance URL (e.g. "https://canvas.instructure.com")
    pub base_url: Option<String>,

    /// Canvas API developer key
    pub api_key: Option<String>,

    /// Page size for paginated endpoints
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_per_page() -> usize {
    100
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            per_page: default_per_page(),
        }
    }
}

/// External grader process settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraderConfig {
    /// Per-submission timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Grace period between SIGTERM and SIGKILL, in seconds
    #[serde(default = "default_kill_grace_secs")]
    pub kill_grace_secs: u64,

    /// Working directory to run the grader in (defaults to the grader's own
    /// directory semantics: the current directory)
    pub working_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_kill_grace_secs() -> u64 {
    1
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            kill_grace_secs: default_kill_grace_secs(),
            working_dir: None,
        }
    }
}

impl SpeedgraderConfig {
    /// Validate the configuration for values that are never acceptable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grader.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "grader.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.canvas.per_page == 0 {
            return Err(ConfigError::Invalid(
                "canvas.per_page must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Path to the global config file. Honors XDG_CONFIG_HOME, falling back to
/// ~/.config/speedgrader/config.toml.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "speedgrader").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Loads configuration from all layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace directory (usually the cwd).
    pub fn load(workspace_root: &Path) -> Result<SpeedgraderConfig, ConfigError> {
        let mut builder = Self::builder_with_defaults()?;
        builder = Self::add_global_file(builder);

        let workspace_file = workspace_root.join("speedgrader.toml");
        if workspace_file.exists() {
            builder = builder.add_source(File::from(workspace_file).required(false));
        }

        builder = builder.add_source(Environment::with_prefix("SPEEDGRADER").separator("__"));

        let config: SpeedgraderConfig = builder.build()?.try_deserialize().map_err(ConfigError::from)?;
        let config = Self::apply_env_credentials(config);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file, skipping global/workspace
    /// discovery. Environment credentials still apply.
    pub fn load_from_file(path: &Path) -> Result<SpeedgraderConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let builder = Self::builder_with_defaults()?.add_source(File::from(path.to_path_buf()));
        let config: SpeedgraderConfig = builder.build()?.try_deserialize().map_err(ConfigError::from)?;
        let config = Self::apply_env_credentials(config);
        config.validate()?;
        Ok(config)
    }

    fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Config::try_from(&SpeedgraderConfig::default())?;
        Ok(Config::builder().add_source(defaults))
    }

    fn add_global_file(mut builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }
        builder
    }

    /// CANVAS_URL and CANVAS_API_KEY keep their historical names and override
    /// file values.
    fn apply_env_credentials(mut config: SpeedgraderConfig) -> SpeedgraderConfig {
        if let Ok(url) = std::env::var("CANVAS_URL") {
            if !url.is_empty() {
                config.canvas.base_url = Some(url);
            }
        }
        if let Ok(key) = std::env::var("CANVAS_API_KEY") {
            if !key.is_empty() {
                config.canvas.api_key = Some(key);
            }
        }
        config
    }

    /// Write a starter `speedgrader.toml` for `speedgrader init`.
    pub fn write_starter_config(path: &Path, force: bool) -> Result<PathBuf, ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::Invalid(format!(
                "{} already exists; pass --force to overwrite",
                path.display()
            )));
        }

        let starter = SpeedgraderConfig {
            canvas: CanvasConfig {
                base_url: Some("https://canvas.instructure.com".to_string()),
                api_key: Some("REPLACE_WITH_YOUR_API_KEY".to_string()),
                per_page: default_per_page(),
            },
            ..SpeedgraderConfig::default()
        };

        let body = toml::to_string_pretty(&starter)
            .map_err(|e| ConfigError::Invalid(format!("Failed to render starter config: {}", e)))?;
        std::fs::write(path, body)?;
        Ok(path.to_path_buf())
    }
}
