//! HTTP facade for Stampede virtual users
//!
//! Thin verb wrappers that attach role-based auth, serialize JSON bodies,
//! measure latency and log failed responses. Calls never return errors:
//! transport failures surface as a [`RequestOutcome`] with status 0.

pub mod client;
pub mod errors;
pub mod response;
pub mod types;

// Re-export main types for convenience
pub use client::{ApiClient, Credentials, HttpClient};
pub use stampede_config::HttpConfig;
pub use errors::HttpError;
pub use response::RequestOutcome;
pub use types::{ApiRequest, HttpMethod};
