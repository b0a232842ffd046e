//! Result file output configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and how run results are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one JSON result file per test
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// chrono format string used in result file names
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Pretty-print result files
    #[serde(default = "crate::domains::utils::default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            timestamp_format: default_timestamp_format(),
            pretty: true,
        }
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(self.validation_error("directory cannot be empty"));
        }

        validate_required_string(&self.timestamp_format, "timestamp_format", self.domain_name())?;

        if self.timestamp_format.contains('/') {
            return Err(self.validation_error("timestamp_format cannot contain path separators"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "output"
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("results")
}

fn default_timestamp_format() -> String {
    "%Y%m%d_%H%M%S".to_string()
}
