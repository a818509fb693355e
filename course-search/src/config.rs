use crate::error::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_LIMIT: u64 = 20;
pub const DEFAULT_SEARCH_PATH: &str = "/search";

/// Settings for the search page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size used when the URL carries no `limit`.
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Path the encoded query string is rooted at.
    #[serde(default = "default_search_path")]
    pub search_path: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            search_path: default_search_path(),
        }
    }
}

impl SearchConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit == 0 {
            return Err(ConfigError::Invalid(
                "default_limit must be greater than zero".to_string(),
            ));
        }
        if !self.search_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "search_path `{}` must start with `/`",
                self.search_path
            )));
        }
        if self.search_path.contains(['?', '#']) {
            return Err(ConfigError::Invalid(format!(
                "search_path `{}` must not carry a query or fragment",
                self.search_path
            )));
        }
        Ok(())
    }
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

fn default_search_path() -> String {
    DEFAULT_SEARCH_PATH.to_string()
}
