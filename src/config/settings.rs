//! Typed settings read from the merged configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::client::HttpConfig;
use crate::extract::StoreSettings;

use super::ConfigError;

/// Upper bound for `request_timeout_seconds`
pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryManagerSettings {
    pub base_url: String,
    pub request_timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreNames {
    pub shared_imports: String,
    pub shared_releases: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionSettings {
    pub promote_build_output: bool,
}

/// Settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub repository_manager: RepositoryManagerSettings,
    pub stores: StoreNames,
    pub promotion: PromotionSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rm = &self.repository_manager;

        let url = Url::parse(&rm.base_url).map_err(|e| {
            ConfigError::Validation(format!(
                "repository_manager.base_url is not a valid URL: {}",
                e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "repository_manager.base_url must use http or https, got {}",
                url.scheme()
            )));
        }

        if rm.request_timeout_seconds == 0 || rm.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
            return Err(ConfigError::Validation(format!(
                "repository_manager.request_timeout_seconds must be in (0, {}]",
                MAX_REQUEST_TIMEOUT_SECONDS
            )));
        }

        if self.stores.shared_imports.trim().is_empty() {
            return Err(ConfigError::Validation(
                "stores.shared_imports must not be empty".to_string(),
            ));
        }
        if self.stores.shared_releases.trim().is_empty() {
            return Err(ConfigError::Validation(
                "stores.shared_releases must not be empty".to_string(),
            ));
        }
        if self.stores.shared_imports == self.stores.shared_releases {
            return Err(ConfigError::Validation(
                "stores.shared_imports and stores.shared_releases must differ".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.repository_manager.request_timeout_seconds)
    }

    /// Transport configuration for the repository manager
    pub fn http_config(&self) -> Result<HttpConfig, ConfigError> {
        let config = HttpConfig::new(&self.repository_manager.base_url, self.request_timeout())
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(config.with_auth_token(self.repository_manager.auth_token.clone()))
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            shared_imports: self.stores.shared_imports.clone(),
            shared_releases: self.stores.shared_releases.clone(),
            promote_build_output: self.promotion.promote_build_output,
        }
    }
}
