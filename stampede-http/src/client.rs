//! HTTP client implementation

use crate::errors::HttpError;
use crate::response::RequestOutcome;
use crate::types::ApiRequest;
use reqwest::{header::ACCEPT, Client};
use serde_json::Value as JsonValue;
use stampede_config::{HttpConfig, Role, TargetConfig};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Characters of the response body included in failure log lines
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// HTTP client trait used by scenarios.
///
/// `execute` never fails: transport problems are reported through the
/// returned outcome. The verb helpers and `batch` are built on `execute`.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> RequestOutcome;

    async fn get(&self, path: &str, role: Option<Role>, context: &str) -> RequestOutcome {
        self.execute(with_role(ApiRequest::get(path), role).with_context(context))
            .await
    }

    async fn post(
        &self,
        path: &str,
        body: JsonValue,
        role: Option<Role>,
        context: &str,
    ) -> RequestOutcome {
        self.execute(with_role(ApiRequest::post(path, body), role).with_context(context))
            .await
    }

    async fn put(
        &self,
        path: &str,
        body: JsonValue,
        role: Option<Role>,
        context: &str,
    ) -> RequestOutcome {
        self.execute(with_role(ApiRequest::put(path, body), role).with_context(context))
            .await
    }

    async fn delete(&self, path: &str, role: Option<Role>, context: &str) -> RequestOutcome {
        self.execute(with_role(ApiRequest::delete(path), role).with_context(context))
            .await
    }

    /// Dispatch all requests concurrently.
    ///
    /// Outcomes come back in request order; each must be inspected on its own.
    async fn batch(&self, requests: Vec<ApiRequest>) -> Vec<RequestOutcome> {
        debug!("Dispatching batch of {} requests", requests.len());
        futures::future::join_all(requests.into_iter().map(|request| self.execute(request))).await
    }
}

fn with_role(request: ApiRequest, role: Option<Role>) -> ApiRequest {
    match role {
        Some(role) => request.as_role(role),
        None => request,
    }
}

/// Bearer tokens per role
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    tokens: BTreeMap<Role, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, role: Role, token: impl Into<String>) -> Self {
        self.tokens.insert(role, token.into());
        self
    }

    pub fn token_for(&self, role: Role) -> Option<&str> {
        self.tokens
            .get(&role)
            .map(String::as_str)
            .filter(|token| !token.is_empty())
    }
}

impl From<&TargetConfig> for Credentials {
    fn from(target: &TargetConfig) -> Self {
        Role::all()
            .iter()
            .filter_map(|role| target.token_for(*role).map(|token| (*role, token)))
            .fold(Credentials::new(), |credentials, (role, token)| {
                credentials.with_token(role, token)
            })
    }
}

/// reqwest-backed client bound to one base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
    // one flag per role so a missing token is reported once, not per request
    missing_token_warned: Arc<[AtomicBool; 3]>,
}

impl ApiClient {
    /// Create a client with a pooled connection set for `base_url`
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        config: &HttpConfig,
    ) -> Result<Self, HttpError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        debug!(
            "Creating ApiClient for {} with timeout: {}s",
            base_url,
            config.timeout.as_secs()
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(config.idle_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
            missing_token_warned: Arc::new([
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
            ]),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a path; absolute URLs pass through unchanged
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn warn_missing_token(&self, role: Role) {
        let index = match role {
            Role::User => 0,
            Role::Admin => 1,
            Role::SuperUser => 2,
        };
        if !self.missing_token_warned[index].swap(true, Ordering::Relaxed) {
            warn!(
                "No token configured for role '{}' (set {}); sending requests unauthenticated",
                role,
                role.token_env_var()
            );
        }
    }
}

#[async_trait::async_trait]
impl HttpClient for ApiClient {
    async fn execute(&self, request: ApiRequest) -> RequestOutcome {
        let url = self.url_for(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.into(), &url)
            .header(ACCEPT, "application/json");

        if let Some(role) = request.role {
            match self.credentials.token_for(role) {
                Some(token) => builder = builder.bearer_auth(token),
                None => self.warn_missing_token(role),
            }
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let elapsed = started.elapsed();
                warn!("{} failed: no response ({})", request.context, e);
                return RequestOutcome::transport_failure(request.method, url, elapsed, e.to_string());
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!("Failed to read response body for {}: {}", request.context, e);
                String::new()
            }
        };
        let elapsed = started.elapsed();

        let outcome = RequestOutcome {
            method: request.method,
            url,
            status,
            body,
            elapsed,
            error: None,
        };

        if status >= 400 {
            warn!(
                "{} failed: status {} body {}",
                request.context,
                status,
                outcome.body_preview(ERROR_BODY_PREVIEW_CHARS)
            );
        } else {
            debug!(
                "{} -> {} in {:.1}ms",
                request.context,
                status,
                outcome.elapsed_ms()
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(
            "http://localhost:8080/",
            Credentials::new(),
            &HttpConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_url_for() {
        let client = client();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url_for("/products"), "http://localhost:8080/products");
        assert_eq!(client.url_for("products/1"), "http://localhost:8080/products/1");
        assert_eq!(
            client.url_for("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = ApiClient::new("QA", Credentials::new(), &HttpConfig::default());
        assert!(matches!(result, Err(HttpError::InvalidUrl(_))));
    }

    #[test]
    fn test_credentials_from_target() {
        let mut target = TargetConfig::default();
        target.set_token(Role::User, "u");
        target.set_token(Role::Admin, "");

        let credentials = Credentials::from(&target);
        assert_eq!(credentials.token_for(Role::User), Some("u"));
        assert_eq!(credentials.token_for(Role::Admin), None);
        assert_eq!(credentials.token_for(Role::SuperUser), None);
    }
}
