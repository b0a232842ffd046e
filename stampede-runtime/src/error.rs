//! Runtime error types

use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Load test '{0}' declares no scenarios")]
    NoScenarios(String),

    #[error("Scenario '{0}' is declared more than once")]
    DuplicateScenario(String),

    #[error("Invalid scenario '{name}': {reason}")]
    InvalidScenario { name: String, reason: String },

    #[error("Virtual user task failed: {0}")]
    VuTask(#[from] tokio::task::JoinError),

    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
