//! Load profiles: how many virtual users, for how long

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Named load profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProfileName {
    Smoke,
    Light,
    Medium,
    Heavy,
}

impl ProfileName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileName::Smoke => "SMOKE",
            ProfileName::Light => "LIGHT",
            ProfileName::Medium => "MEDIUM",
            ProfileName::Heavy => "HEAVY",
        }
    }

    pub fn all() -> &'static [ProfileName] {
        &[
            ProfileName::Smoke,
            ProfileName::Light,
            ProfileName::Medium,
            ProfileName::Heavy,
        ]
    }
}

impl Default for ProfileName {
    fn default() -> Self {
        ProfileName::Smoke
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMOKE" => Ok(ProfileName::Smoke),
            "LIGHT" => Ok(ProfileName::Light),
            "MEDIUM" => Ok(ProfileName::Medium),
            "HEAVY" => Ok(ProfileName::Heavy),
            _ => Err(ConfigError::UnknownName {
                kind: "profile",
                value: s.to_string(),
                choices: "SMOKE, LIGHT, MEDIUM, HEAVY".to_string(),
            }),
        }
    }
}

/// Virtual-user count and duration for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadProfile {
    pub virtual_users: u32,

    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    #[serde(default)]
    pub description: String,
}

impl LoadProfile {
    pub fn new(virtual_users: u32, duration: Duration, description: impl Into<String>) -> Self {
        Self {
            virtual_users,
            duration,
            description: description.into(),
        }
    }

    /// Built-in definition of a named profile
    pub fn builtin(name: ProfileName) -> Self {
        match name {
            ProfileName::Smoke => Self::new(
                1,
                Duration::from_secs(30),
                "Smoke test: single user sanity check",
            ),
            ProfileName::Light => Self::new(
                10,
                Duration::from_secs(2 * 60),
                "Light load: normal daytime traffic",
            ),
            ProfileName::Medium => Self::new(
                50,
                Duration::from_secs(5 * 60),
                "Medium load: busy period traffic",
            ),
            ProfileName::Heavy => Self::new(
                100,
                Duration::from_secs(10 * 60),
                "Heavy load: peak traffic stress",
            ),
        }
    }
}

impl Validatable for LoadProfile {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.virtual_users, "virtual_users", self.domain_name())?;
        validate_positive(self.duration.as_millis(), "duration", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "profiles.profile"
    }
}

/// Profile selection plus per-profile overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    /// Profile used when none is given on the command line
    #[serde(default)]
    pub selected: ProfileName,

    /// Replacements for the built-in profile definitions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<ProfileName, LoadProfile>,
}

impl ProfilesConfig {
    /// Profile definition for a name, honouring overrides
    pub fn get(&self, name: ProfileName) -> LoadProfile {
        self.overrides
            .get(&name)
            .cloned()
            .unwrap_or_else(|| LoadProfile::builtin(name))
    }

    /// Definition of the selected profile
    pub fn selected_profile(&self) -> LoadProfile {
        self.get(self.selected)
    }
}

impl Validatable for ProfilesConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (name, profile) in &self.overrides {
            profile.validate().map_err(|e| {
                self.validation_error(format!("profile {} is invalid: {}", name, e))
            })?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "profiles"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_name_from_str() {
        assert_eq!("smoke".parse::<ProfileName>().unwrap(), ProfileName::Smoke);
        assert_eq!("HEAVY".parse::<ProfileName>().unwrap(), ProfileName::Heavy);
        assert!("EXTREME".parse::<ProfileName>().is_err());
    }

    #[test]
    fn test_builtin_profiles_are_valid() {
        for name in ProfileName::all() {
            assert!(LoadProfile::builtin(*name).validate().is_ok());
        }
        assert_eq!(LoadProfile::builtin(ProfileName::Smoke).virtual_users, 1);
        assert_eq!(LoadProfile::builtin(ProfileName::Heavy).virtual_users, 100);
    }

    #[test]
    fn test_override_replaces_builtin() {
        let yaml = r#"
selected: LIGHT
overrides:
  LIGHT:
    virtual_users: 3
    duration: 15s
"#;
        let config: ProfilesConfig = serde_yaml::from_str(yaml).unwrap();
        let light = config.selected_profile();
        assert_eq!(light.virtual_users, 3);
        assert_eq!(light.duration, Duration::from_secs(15));
        assert_eq!(config.get(ProfileName::Medium).virtual_users, 50);
    }

    #[test]
    fn test_zero_vu_override_is_rejected() {
        let mut config = ProfilesConfig::default();
        config.overrides.insert(
            ProfileName::Smoke,
            LoadProfile::new(0, Duration::from_secs(1), ""),
        );
        assert!(config.validate().is_err());
    }
}
