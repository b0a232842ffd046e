//! Target environment, host resolution and role tokens

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Roles a virtual user can authenticate as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    SuperUser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperUser => "super_user",
        }
    }

    pub fn all() -> &'static [Role] {
        &[Role::User, Role::Admin, Role::SuperUser]
    }

    /// Environment variable carrying the bearer token for this role
    pub fn token_env_var(&self) -> &'static str {
        match self {
            Role::User => "TOKEN_USER",
            Role::Admin => "TOKEN_ADMIN",
            Role::SuperUser => "TOKEN_SUPER_USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "super_user" | "superuser" => Ok(Role::SuperUser),
            _ => Err(ConfigError::UnknownName {
                kind: "role",
                value: s.to_string(),
                choices: "user, admin, super_user".to_string(),
            }),
        }
    }
}

/// Target configuration: named environments, the selected one, and tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Environment name (DEV, STAGING, PROD, LOCAL) or a literal base URL
    #[serde(default = "default_host")]
    pub host: String,

    /// Known environments and their base URLs
    #[serde(default = "default_hosts")]
    pub hosts: BTreeMap<String, String>,

    /// Bearer tokens per role
    #[serde(default)]
    pub tokens: BTreeMap<Role, String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            hosts: default_hosts(),
            tokens: BTreeMap::new(),
        }
    }
}

impl TargetConfig {
    /// Base URL of the selected environment
    pub fn base_url(&self) -> String {
        self.resolve_base_url(&self.host)
    }

    /// Resolve an environment name to its base URL.
    ///
    /// Names are matched case-insensitively. A name that is not a known
    /// environment is returned unchanged so ad hoc URLs can be passed in
    /// place of an environment name.
    pub fn resolve_base_url(&self, name: &str) -> String {
        let known = self
            .hosts
            .iter()
            .find(|(env, _)| env.eq_ignore_ascii_case(name))
            .map(|(_, url)| url.trim_end_matches('/').to_string());

        match known {
            Some(url) => url,
            None => {
                if url::Url::parse(name).is_err() {
                    warn!(
                        "Host '{}' is neither a known environment ({}) nor a URL",
                        name,
                        self.environment_names().join(", ")
                    );
                }
                name.trim_end_matches('/').to_string()
            }
        }
    }

    /// Bearer token configured for a role, if any
    pub fn token_for(&self, role: Role) -> Option<&str> {
        self.tokens
            .get(&role)
            .map(String::as_str)
            .filter(|token| !token.is_empty())
    }

    pub fn set_token(&mut self, role: Role, token: impl Into<String>) {
        self.tokens.insert(role, token.into());
    }

    pub fn environment_names(&self) -> Vec<&str> {
        self.hosts.keys().map(String::as_str).collect()
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.hosts.is_empty() {
            return Err(self.validation_error("At least one host environment must be configured"));
        }

        for (name, url) in &self.hosts {
            validate_url(url, &format!("hosts.{}", name), self.domain_name())?;
        }

        if self.host.trim().is_empty() {
            return Err(self.validation_error("host cannot be empty"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

fn default_host() -> String {
    "LOCAL".to_string()
}

fn default_hosts() -> BTreeMap<String, String> {
    [
        ("DEV", "https://dev-api.example.com"),
        ("STAGING", "https://staging-api.example.com"),
        ("PROD", "https://api.example.com"),
        ("LOCAL", "http://localhost:8080"),
    ]
    .into_iter()
    .map(|(name, url)| (name.to_string(), url.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_environment() {
        let config = TargetConfig::default();
        assert_eq!(config.resolve_base_url("STAGING"), "https://staging-api.example.com");
        assert_eq!(config.resolve_base_url("local"), "http://localhost:8080");
    }

    #[test]
    fn test_unknown_environment_is_literal_override() {
        let config = TargetConfig::default();
        assert_eq!(
            config.resolve_base_url("http://10.0.0.5:9000/"),
            "http://10.0.0.5:9000"
        );
        assert_eq!(config.resolve_base_url("QA"), "QA");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("super-user".parse::<Role>().unwrap(), Role::SuperUser);
        assert_eq!("superuser".parse::<Role>().unwrap(), Role::SuperUser);
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn test_missing_or_empty_token_is_none() {
        let mut config = TargetConfig::default();
        assert_eq!(config.token_for(Role::Admin), None);

        config.set_token(Role::Admin, "");
        assert_eq!(config.token_for(Role::Admin), None);

        config.set_token(Role::Admin, "secret");
        assert_eq!(config.token_for(Role::Admin), Some("secret"));
    }

    #[test]
    fn test_tokens_deserialize_by_role_name() {
        let yaml = r#"
host: DEV
tokens:
  user: u-token
  super_user: s-token
"#;
        let config: TargetConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.token_for(Role::User), Some("u-token"));
        assert_eq!(config.token_for(Role::SuperUser), Some("s-token"));
        assert_eq!(config.base_url(), "https://dev-api.example.com");
    }

    #[test]
    fn test_validation_rejects_bad_host_url() {
        let mut config = TargetConfig::default();
        config.hosts.insert("BROKEN".to_string(), "nope".to_string());
        assert!(config.validate().is_err());
    }
}
