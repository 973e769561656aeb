// Client configuration, loaded from the environment

use std::env;

use reqwest::Url;

use crate::error::ClientError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the internal backend API.
    pub backend_url: String,
    /// Origin serving the same-origin provider proxy.
    pub site_url: String,
    pub square_location_id: String,
    /// Unset keeps reqwest's default.
    pub timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            square_location_id: String::new(),
            timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Reads `BACKEND_API_URL`, `SITE_URL`, `SQUARE_LOCATION_ID` and
    /// `HTTP_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let config = Self {
            backend_url: lookup("BACKEND_API_URL")
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            site_url: lookup("SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            square_location_id: lookup("SQUARE_LOCATION_ID").ok_or_else(|| {
                ClientError::ConfigError("SQUARE_LOCATION_ID is not set".to_string())
            })?,
            timeout_ms: lookup("HTTP_TIMEOUT_MS").and_then(|s| s.parse().ok()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        for (name, value) in [("backend_url", &self.backend_url), ("site_url", &self.site_url)] {
            let url = Url::parse(value)
                .map_err(|e| ClientError::ConfigError(format!("{name} `{value}`: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ClientError::ConfigError(format!(
                    "{name} `{value}` must be http or https"
                )));
            }
        }

        if self.square_location_id.trim().is_empty() {
            return Err(ClientError::ConfigError(
                "square_location_id must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
