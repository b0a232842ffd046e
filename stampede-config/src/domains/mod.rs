//! Domain-specific configuration modules

pub mod http;
pub mod logging;
pub mod output;
pub mod profile;
pub mod scenario;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Stampede configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StampedeConfig {
    /// Target environments, selected host and role tokens
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Load profiles and the selected profile
    #[serde(default)]
    pub profiles: profile::ProfilesConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Scenario pacing and request shaping
    #[serde(default)]
    pub scenarios: scenario::ScenarioSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Result file output
    #[serde(default)]
    pub output: output::OutputConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.profiles.validate()?;
        self.http.validate()?;
        self.scenarios.validate()?;
        self.logging.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = StampedeConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
