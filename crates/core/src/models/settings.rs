use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5005";
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// User-configurable settings. The shell decides where to persist them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the confirmation backend (no trailing slash needed).
    pub api_base_url: String,

    /// Directory (or URL prefix) holding the three JSON resources.
    pub assets_dir: String,

    /// Mirror a filter applied on one grid onto the other two.
    pub sync_filters: bool,

    /// Display name of the operator.
    #[serde(default)]
    pub my_name: String,

    /// Legal entity the operator confirms trades for.
    #[serde(default)]
    pub my_entity: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            sync_filters: true,
            my_name: String::new(),
            my_entity: String::new(),
        }
    }
}

impl Settings {
    /// Defaults overridden by non-empty environment variables:
    /// `CONFMGR_API_URL`, `CONFMGR_ASSETS_DIR`, `CONFMGR_SYNC_FILTERS`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if an override is malformed.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut settings = Self::default();

        if let Some(url) = non_empty_var("CONFMGR_API_URL") {
            settings.api_base_url = url;
        }
        if let Some(dir) = non_empty_var("CONFMGR_ASSETS_DIR") {
            settings.assets_dir = dir;
        }
        if let Some(flag) = non_empty_var("CONFMGR_SYNC_FILTERS") {
            settings.sync_filters = parse_flag(&flag).ok_or_else(|| {
                CoreError::Config(format!(
                    "CONFMGR_SYNC_FILTERS must be true/false, got '{flag}'"
                ))
            })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check that the backend URL is usable.
    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "API base URL must start with http:// or https://, got '{url}'"
            )));
        }
        if self.assets_dir.trim().is_empty() {
            return Err(CoreError::Config("assets location must not be empty".into()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
