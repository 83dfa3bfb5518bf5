//! Client configuration

use super::{JobTrackClientBuilder, error::ClientError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for [`super::JobTrackClient`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Request timeout in seconds. `None` keeps the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Timeout for the token refresh call in seconds. `None` keeps the
    /// transport default.
    #[serde(default)]
    pub refresh_timeout_secs: Option<u64>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: None,
            refresh_timeout_secs: None,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Check the settings before building a client
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::Configuration(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_secs == Some(0) || self.refresh_timeout_secs == Some(0) {
            return Err(ClientError::Configuration(
                "timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Seed a client builder with these settings
    pub fn builder(&self) -> Result<JobTrackClientBuilder, ClientError> {
        self.validate()?;

        let mut builder = JobTrackClientBuilder::default().base_url(&self.base_url);
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.refresh_timeout_secs {
            builder = builder.refresh_timeout(Duration::from_secs(secs));
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_url() {
        let config = ClientConfig {
            base_url: "localhost:8000".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let config = ClientConfig {
            refresh_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builds_client_from_defaults() {
        let client = ClientConfig::default().builder().unwrap().build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
