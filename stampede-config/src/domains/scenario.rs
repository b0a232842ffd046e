//! Scenario pacing and request shaping

use crate::domains::target::Role;
use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by the product scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    /// Collection path of the resource under test
    #[serde(default = "default_resource_path")]
    pub resource_path: String,

    /// Page size requested by list calls
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// List calls pick a page number in 1..=max_page
    #[serde(default = "default_max_page")]
    pub max_page: u32,

    /// Upper bound on the number of items a list page may carry
    #[serde(default = "default_max_list_items")]
    pub max_list_items: usize,

    /// First id used by detail reads
    #[serde(default = "default_detail_id_min")]
    pub detail_id_min: u64,

    /// Last id used by detail reads
    #[serde(default = "default_detail_id_max")]
    pub detail_id_max: u64,

    /// Pause after each scenario iteration
    #[serde(with = "humantime_serde", default = "default_think_time")]
    pub think_time: Duration,

    /// Pause between CRUD lifecycle steps
    #[serde(with = "humantime_serde", default = "default_crud_step_pause")]
    pub crud_step_pause: Duration,

    /// Delay before the create pool starts in the mixed test
    #[serde(with = "humantime_serde", default = "default_create_start_offset")]
    pub create_start_offset: Duration,

    /// Role used for read requests
    #[serde(default = "default_read_role")]
    pub read_role: Role,

    /// Role used for create/update/delete requests
    #[serde(default = "default_write_role")]
    pub write_role: Role,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            resource_path: default_resource_path(),
            page_size: default_page_size(),
            max_page: default_max_page(),
            max_list_items: default_max_list_items(),
            detail_id_min: default_detail_id_min(),
            detail_id_max: default_detail_id_max(),
            think_time: default_think_time(),
            crud_step_pause: default_crud_step_pause(),
            create_start_offset: default_create_start_offset(),
            read_role: default_read_role(),
            write_role: default_write_role(),
        }
    }
}

impl ScenarioSettings {
    /// Path of a single item
    pub fn item_path(&self, id: impl std::fmt::Display) -> String {
        format!("{}/{}", self.resource_path.trim_end_matches('/'), id)
    }

    /// Path of a list page
    pub fn list_path(&self, page: u32) -> String {
        format!(
            "{}?pageNumber={}&pageSize={}",
            self.resource_path.trim_end_matches('/'),
            page,
            self.page_size
        )
    }
}

impl Validatable for ScenarioSettings {
    fn validate(&self) -> ConfigResult<()> {
        if !self.resource_path.starts_with('/') {
            return Err(self.validation_error("resource_path must start with '/'"));
        }

        validate_positive(self.page_size, "page_size", self.domain_name())?;
        validate_positive(self.max_page, "max_page", self.domain_name())?;
        validate_positive(self.max_list_items, "max_list_items", self.domain_name())?;

        if self.page_size as usize > self.max_list_items {
            return Err(self.validation_error(format!(
                "page_size ({}) cannot exceed max_list_items ({})",
                self.page_size, self.max_list_items
            )));
        }

        if self.detail_id_min > self.detail_id_max {
            return Err(self.validation_error(format!(
                "detail_id_min ({}) cannot exceed detail_id_max ({})",
                self.detail_id_min, self.detail_id_max
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scenarios"
    }
}

// Default value functions
fn default_resource_path() -> String {
    "/products".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page() -> u32 {
    5
}

fn default_max_list_items() -> usize {
    100
}

fn default_detail_id_min() -> u64 {
    1
}

fn default_detail_id_max() -> u64 {
    100
}

fn default_think_time() -> Duration {
    Duration::from_secs(1)
}

fn default_crud_step_pause() -> Duration {
    Duration::from_millis(500)
}

fn default_create_start_offset() -> Duration {
    Duration::from_secs(10)
}

fn default_read_role() -> Role {
    Role::User
}

fn default_write_role() -> Role {
    Role::Admin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let settings = ScenarioSettings::default();
        assert_eq!(settings.list_path(1), "/products?pageNumber=1&pageSize=10");
        assert_eq!(settings.item_path(42), "/products/42");
    }

    #[test]
    fn test_validation() {
        let mut settings = ScenarioSettings::default();
        assert!(settings.validate().is_ok());

        settings.page_size = 500;
        assert!(settings.validate().is_err());

        settings = ScenarioSettings::default();
        settings.detail_id_min = 10;
        settings.detail_id_max = 1;
        assert!(settings.validate().is_err());

        settings = ScenarioSettings::default();
        settings.resource_path = "products".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_humantime_durations() {
        let yaml = r#"
think_time: 250ms
crud_step_pause: 0s
write_role: super_user
"#;
        let settings: ScenarioSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.think_time, Duration::from_millis(250));
        assert_eq!(settings.crud_step_pause, Duration::ZERO);
        assert_eq!(settings.write_role, Role::SuperUser);
        assert_eq!(settings.create_start_offset, Duration::from_secs(10));
    }
}
