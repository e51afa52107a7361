use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DeployError, DeployResult};

pub const DEFAULT_API_BASE_URL: &str = "https://api.meraki.com/api/v1";
pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

/// Environment variable that overrides the credential from the settings file.
pub const API_KEY_ENV: &str = "NETCLAIM_API_KEY";

/// Resolved, validated settings. Immutable for the run; every component
/// receives this by reference instead of reading ambient state.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub organization_id: String,
    pub api_key: String,
    pub default_timezone: String,
}

/// On-disk shape of the settings file (JSON). All fields optional so that
/// validation can report what is actually missing.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    dashboard_api_base_url: Option<String>,
    #[serde(default)]
    organization_id: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    default_timezone: Option<String>,
}

impl Settings {
    /// Load settings from a JSON file, with the API key overridable from the
    /// environment. Fails fast on a missing file or missing required fields;
    /// no remote call happens before this succeeds.
    pub fn load(path: &Path) -> DeployResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            DeployError::config(format!("cannot read settings file {}: {}", path.display(), e))
        })?;
        let file: SettingsFile = serde_json::from_str(&raw).map_err(|e| {
            DeployError::config(format!("invalid settings file {}: {}", path.display(), e))
        })?;

        let api_key = env::var(API_KEY_ENV).ok().or(file.api_key);

        let settings = Self {
            api_base_url: file
                .dashboard_api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            organization_id: file.organization_id.unwrap_or_default(),
            api_key: api_key.unwrap_or_default(),
            default_timezone: file
                .default_timezone
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> DeployResult<()> {
        if self.api_key.is_empty() {
            return Err(DeployError::config(format!(
                "missing API key: set {} or \"api_key\" in the settings file",
                API_KEY_ENV
            )));
        }
        if self.organization_id.is_empty() {
            return Err(DeployError::config(
                "missing \"organization_id\" in the settings file",
            ));
        }
        if !self.api_base_url.starts_with("http") {
            return Err(DeployError::config(format!(
                "invalid dashboard_api_base_url: {}",
                self.api_base_url
            )));
        }
        Ok(())
    }
}
