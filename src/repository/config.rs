//! Remote Store Configuration
//!
//! Connection settings for the Airtable table. Built once and handed to the
//! repository; nothing reads the environment after that.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

pub const ENV_BASE_ID: &str = "AIRTABLE_BASE_ID";
pub const ENV_TABLE_NAME: &str = "AIRTABLE_TABLE_NAME";
pub const ENV_TOKEN: &str = "AIRTABLE_PAT";
pub const ENV_API_URL: &str = "AIRTABLE_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "AIRTABLE_TIMEOUT_SECS";

/// Where the todo table lives and how to authenticate
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub base_id: String,
    pub table_name: String,
    /// Personal access token, sent as a bearer token
    pub token: String,
    /// No timeout when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl RemoteConfig {
    pub fn new(base_id: impl Into<String>, table_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: default_api_url(),
            base_id: base_id.into(),
            table_name: table_name.into(),
            token: token.into(),
            timeout_secs: None,
        }
    }

    /// Read the configuration from process environment variables
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, .env map, ...)
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| DomainError::InvalidInput(format!("{} is not set", key)))
        };

        let timeout_secs = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                DomainError::InvalidInput(format!("{} is not a number: {}", ENV_TIMEOUT_SECS, e))
            })?),
            None => None,
        };

        let config = Self {
            api_url: lookup(ENV_API_URL).unwrap_or_else(default_api_url),
            base_id: required(ENV_BASE_ID)?,
            table_name: required(ENV_TABLE_NAME)?,
            token: required(ENV_TOKEN)?,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load_from_file(path: &Path) -> DomainResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::NotFound(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| DomainError::InvalidInput(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> DomainResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| DomainError::Internal(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| DomainError::Internal(format!("Failed to write {}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.base_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("base id is empty".to_string()));
        }
        if self.table_name.trim().is_empty() {
            return Err(DomainError::InvalidInput("table name is empty".to_string()));
        }
        if self.token.trim().is_empty() {
            return Err(DomainError::InvalidInput("token is empty".to_string()));
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(DomainError::InvalidInput(format!("api url must be http(s): {}", self.api_url)));
        }
        Ok(())
    }

    /// Collection endpoint for the todo table
    pub fn records_url(&self) -> String {
        let table = percent_encoding::utf8_percent_encode(&self.table_name, percent_encoding::NON_ALPHANUMERIC);
        format!("{}/{}/{}", self.api_url.trim_end_matches('/'), self.base_id, table)
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_url", &self.api_url)
            .field("base_id", &self.base_id)
            .field("table_name", &self.table_name)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
