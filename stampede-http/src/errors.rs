//! Client construction errors
//!
//! Requests themselves never fail with an error; see [`crate::RequestOutcome`].

/// Why an [`crate::ApiClient`] could not be built
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_message_names_the_url() {
        let error = HttpError::InvalidUrl("QA: relative URL without a base".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid base URL: QA: relative URL without a base"
        );
    }
}
