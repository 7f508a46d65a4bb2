use crate::models::AdapterConfig;
use ::config::{Config, Environment, File, FileFormat};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the adapter configuration inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "reactive-query.yaml";

/// Prefix of environment variables overriding file settings
pub const ENV_PREFIX: &str = "REACTIVE_QUERY";

/// Configuration manager for loading and saving the adapter configuration.
///
/// Settings are layered, later sources winning:
/// - built-in defaults of [`AdapterConfig`]
/// - `reactive-query.yaml` in the configuration directory (optional)
/// - environment variables such as `REACTIVE_QUERY_CHANGE_BUFFER=16` or
///   `REACTIVE_QUERY_LOGGING__DEBUG_MODE=true`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
    env_prefix: String,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if it doesn't exist.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            env_prefix: ENV_PREFIX.to_string(),
            config_dir,
        })
    }

    /// Use a different environment variable prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load the layered configuration.
    ///
    /// A missing file is not an error; defaults (and environment overrides) apply.
    pub fn load(&self) -> Result<AdapterConfig> {
        self.load_from(self.environment())
    }

    fn environment(&self) -> Environment {
        Environment::with_prefix(&self.env_prefix)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_from(&self, environment: Environment) -> Result<AdapterConfig> {
        if !self.config_path.exists() {
            tracing::warn!("Config file not found at {}, using defaults", self.config_path);
        }

        let settings = Config::builder()
            .add_source(File::new(self.config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: AdapterConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Save `config` as YAML, replacing the file
    pub fn save(&self, config: &AdapterConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
