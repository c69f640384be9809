use super::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::error::{ConfigError, Error};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,

    /// Milliseconds before an API request is abandoned
    #[serde(default = "ApiConfig::default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: ApiConfig::default_base_url(),
            request_timeout: ApiConfig::default_request_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    pub const fn default_request_timeout() -> u64 {
        DEFAULT_REQUEST_TIMEOUT
    }

    ///
    /// Parsed base url
    ///
    /// Always ends in `/` so a path prefix such as `/v2` is kept when endpoint paths are joined.
    ///
    pub fn base_url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidBaseUrl {
            url: self.base_url.to_owned(),
        })?;

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.to_owned(),
            }
            .into()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_must_be_http() {
        let config = ApiConfig {
            base_url: "ftp://organlink.example".to_string(),
            ..Default::default()
        };
        assert!(config.base_url().is_err());

        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.base_url(),
            Err(Error::Config(ConfigError::InvalidBaseUrl { .. }))
        ));

        let config = ApiConfig::default();
        assert_eq!(config.base_url().unwrap().as_str(), "http://localhost:5000/");

        let config = ApiConfig {
            base_url: "https://organlink.example/v2".to_string(),
            ..Default::default()
        };
        assert_eq!(config.base_url().unwrap().as_str(), "https://organlink.example/v2/");
    }

    #[test]
    fn request_timeout_is_milliseconds() {
        let config = ApiConfig {
            request_timeout: 1500,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));
    }
}
