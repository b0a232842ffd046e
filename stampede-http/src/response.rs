//! Per-call request outcome

use crate::types::HttpMethod;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// What a single HTTP call produced.
///
/// `status` is 0 when no response arrived (connect error, timeout); `error`
/// then carries the transport message.
#[derive(Debug, Clone, Serialize)]
pub struct RequestOutcome {
    pub method: HttpMethod,
    pub url: String,
    pub status: u16,
    pub body: String,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestOutcome {
    /// Outcome for a call that never got a response
    pub fn transport_failure(
        method: HttpMethod,
        url: impl Into<String>,
        elapsed: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            status: 0,
            body: String::new(),
            elapsed,
            error: Some(error.into()),
        }
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Parsed body, or `None` when it is not valid JSON
    pub fn parsed_body(&self) -> Option<JsonValue> {
        self.json().ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Whether the call failed at the HTTP level (no response, or status >= 400)
    pub fn is_failure(&self) -> bool {
        self.status == 0 || self.status >= 400
    }

    /// Elapsed time in fractional milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// First `max_chars` characters of the body
    pub fn body_preview(&self, max_chars: usize) -> &str {
        truncate_chars(&self.body, max_chars)
    }
}

/// Truncate on a character boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }
}
