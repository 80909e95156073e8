//! Configuration Loader
//!
//! Environment-aware configuration loading: file discovery, environment detection and
//! layering through the `config` crate.

use super::error::{ConfigResult, ConfigurationError};
use super::PipelineCoreConfig;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Base name of the configuration files
pub const CONFIG_FILE_STEM: &str = "pipeline-core";
/// Prefix of overriding environment variables, e.g. `PIPELINE_CORE__EVENT_LOG__BATCH_SIZE`
pub const ENV_PREFIX: &str = "PIPELINE_CORE";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug)]
pub struct ConfigManager {
    config: PipelineCoreConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_env_source(config_dir, environment, None)
    }

    /// Like [`load_from_directory_with_env`](Self::load_from_directory_with_env) but reads
    /// `PIPELINE_CORE__*` overrides from `variables` instead of the process environment
    pub fn load_with_env_vars(
        config_dir: Option<PathBuf>,
        environment: &str,
        variables: HashMap<String, String>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_env_source(config_dir, environment, Some(variables))
    }

    fn load_with_env_source(
        config_dir: Option<PathBuf>,
        environment: &str,
        variables: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment, variables)?;
        config.validate()?;

        info!(
            environment = %environment,
            batch_size = config.event_log.batch_size,
            queue_capacity = config.advising.queue_capacity,
            max_resolution_rounds = config.plan_creation.max_resolution_rounds,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Configuration built from defaults only
    pub fn from_config(config: PipelineCoreConfig, environment: &str) -> ConfigResult<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        }))
    }

    pub fn config(&self) -> &PipelineCoreConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Current environment: `PIPELINE_CORE_ENV`, then `APP_ENV`, then `development`
    pub fn detect_environment() -> String {
        env::var("PIPELINE_CORE_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var("PIPELINE_CORE_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
        variables: Option<HashMap<String, String>>,
    ) -> ConfigResult<PipelineCoreConfig> {
        let defaults = Config::try_from(&PipelineCoreConfig::default())
            .map_err(|e| ConfigurationError::load_error(environment, e))?;
        let base_file = config_directory.join(format!("{CONFIG_FILE_STEM}.yaml"));
        let env_file = config_directory.join(format!("{CONFIG_FILE_STEM}.{environment}.yaml"));

        let env_source = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(variables);

        let merged = Config::builder()
            .add_source(defaults)
            .add_source(File::from(base_file).format(FileFormat::Yaml).required(false))
            .add_source(File::from(env_file).format(FileFormat::Yaml).required(false))
            .add_source(env_source)
            .build()
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        merged
            .try_deserialize()
            .map_err(ConfigurationError::deserialization_error)
    }
}
