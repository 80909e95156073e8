//! # Pipeline Core Configuration
//!
//! Layered configuration loaded with the `config` crate. Later layers override earlier ones:
//!
//! 1. Built-in defaults ([`PipelineCoreConfig::default`])
//! 2. `pipeline-core.yaml` in the configuration directory (optional)
//! 3. `pipeline-core.<environment>.yaml` (optional)
//! 4. `PIPELINE_CORE__<SECTION>__<KEY>` environment variables
//!
//! The merged result is validated before it is handed out.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pipeline_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::load()?;
//! let batch_size = config.config().event_log.batch_size;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineCoreConfig {
    pub plan_creation: PlanCreationConfig,
    pub advising: AdvisingConfig,
    pub event_log: EventLogConfig,
}

impl PipelineCoreConfig {
    /// Reject values the core cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.plan_creation.max_resolution_rounds == 0 {
            return Err(ConfigurationError::invalid_value(
                "plan_creation.max_resolution_rounds",
                "0",
                "must be at least 1",
            ));
        }
        if self.plan_creation.resolver_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "plan_creation.resolver_concurrency",
                "0",
                "must be at least 1",
            ));
        }
        if self.advising.queue_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "advising.queue_capacity",
                "0",
                "must be at least 1",
            ));
        }
        if self.event_log.batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "event_log.batch_size",
                "0",
                "must be at least 1",
            ));
        }
        if self.event_log.ttl_days < 1 {
            return Err(ConfigurationError::invalid_value(
                "event_log.ttl_days",
                self.event_log.ttl_days.to_string(),
                "must be at least 1",
            ));
        }
        if self.event_log.producer_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "event_log.producer_capacity",
                "0",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Plan creation and dependency resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanCreationConfig {
    /// Resolution rounds before a plan is rejected as non-converging
    pub max_resolution_rounds: usize,
    /// Dependencies expanded concurrently within one round
    pub resolver_concurrency: usize,
}

impl Default for PlanCreationConfig {
    fn default() -> Self {
        Self {
            max_resolution_rounds: 256,
            resolver_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisingConfig {
    /// Bound of the advise queue; queuing beyond it fails immediately
    pub queue_capacity: usize,
}

impl Default for AdvisingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// Events per plan execution between two log-event signals
    pub batch_size: u64,
    pub ttl_days: i64,
    /// Buffer of the broadcast log-event producer
    pub producer_capacity: usize,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            ttl_days: crate::events::DEFAULT_EVENT_LOG_TTL_DAYS,
            producer_capacity: 1000,
        }
    }
}
