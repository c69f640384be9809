use super::{
    ApiConfig, LogConfig, LogFormat, DEFAULT_CONFIG_FILE_PATH, DEFAULT_POLL_INTERVAL,
    DEFAULT_TOKEN_FILE, OL_PREFIX,
};
use crate::error::{ConfigError, Error};
use crate::session::Portal;
use crate::Args;
use config::{Config, Environment};
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct OrganLinkConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_portal")]
    pub portal: Portal,

    /// JSON file holding one bearer token per portal
    #[serde(default = "SessionConfig::default_token_file")]
    pub token_file: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NotificationConfig {
    /// Seconds between polls
    #[serde(default = "NotificationConfig::default_poll_interval")]
    pub poll_interval: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "PrometheusConfig::default_port")]
    pub port: u16,
}

/// Config defaults to a file called `organlink.toml` in the current directory.
/// Supports TOML and JSON
/// Variable names should match the struct field names.
///
/// ENV vars can be used to override file settings.
///
/// ENV vars must be prefixed with `OL_`.
///
impl OrganLinkConfig {
    pub fn default_path() -> String {
        DEFAULT_CONFIG_FILE_PATH.to_string()
    }

    pub fn load(args: &Args) -> Result<OrganLinkConfig, Error> {
        let mut config = OrganLinkConfig::build(&args.config_file_path)?;

        // If log level is default, it has not been set by the user in config
        if config.log.level == LogConfig::default_log_level() {
            config.log.level = args.log_level;
        }

        // If log format is default, it has not been set by the user in config
        if config.log.format == LogConfig::default_log_format() {
            config.log.format = args.log_format;
        }

        if let Some(portal) = args.portal {
            config.session.portal = portal;
        }

        Ok(config)
    }

    pub fn build(path: &str) -> Result<Self, Error> {
        // For parsing nested env values such as OL_API__BASE_URL, OL_NOTIFICATIONS__POLL_INTERVAL
        let ol_env_source = Environment::with_prefix(OL_PREFIX)
            .try_parsing(true)
            .separator("__")
            .prefix_separator("_");

        let config: Self = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(ol_env_source)
            .build()?
            .try_deserialize()
            .map_err(|err| match err {
                config::ConfigError::Message(ref s) => match s {
                    s if s.contains("missing field") => {
                        let name = extract_field_name(s).unwrap_or_else(|| "unknown".to_string());
                        ConfigError::MissingParameter { name }
                    }
                    s if s.contains("does not have variant constructor")
                        || s.contains("unknown variant") =>
                    {
                        let (name, value) = extract_invalid_field(s);
                        ConfigError::InvalidParameter { name, value }
                    }
                    _ => err.into(),
                },
                _ => err.into(),
            })?;

        // Fail early rather than on the first request
        config.api.base_url()?;

        if config.api.request_timeout == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "api.request_timeout".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if config.notifications.poll_interval == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "notifications.poll_interval".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(config)
    }

    pub fn use_structured_logging(&self) -> bool {
        matches!(self.log.format, LogFormat::Structured)
    }

    ///
    /// Returns true if Prometheus export is enabled
    ///
    pub fn prometheus_enabled(&self) -> bool {
        self.prometheus.enabled
    }
}

impl Default for OrganLinkConfig {
    fn default() -> Self {
        OrganLinkConfig {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            notifications: NotificationConfig::default(),
            log: LogConfig::default(),
            prometheus: PrometheusConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn default_portal() -> Portal {
        Portal::Hospital
    }

    pub fn default_token_file() -> PathBuf {
        PathBuf::from(DEFAULT_TOKEN_FILE)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            portal: SessionConfig::default_portal(),
            token_file: SessionConfig::default_token_file(),
        }
    }
}

impl NotificationConfig {
    pub const fn default_poll_interval() -> u64 {
        DEFAULT_POLL_INTERVAL
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            poll_interval: NotificationConfig::default_poll_interval(),
        }
    }
}

impl PrometheusConfig {
    pub fn default_port() -> u16 {
        9940
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        PrometheusConfig {
            enabled: false,
            port: PrometheusConfig::default_port(),
        }
    }
}

///
/// Extracts a field name (if present) from a config::ConfigError::Message
/// This is called in `build` if a ConfigError message contains the string `missing field`
///
fn extract_field_name(input: &str) -> Option<String> {
    let re = Regex::new(r"`(\w+)`").ok()?;
    re.captures(input)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
}

///
/// Extracts the enum name and rejected value from a config::ConfigError::Message
///
/// Error strings are `enum {name} does not have variant constructor {value}`
/// or ``unknown variant `{value}`, expected one of ...``
///
fn extract_invalid_field(input: &str) -> (String, String) {
    let default_name = "unknown".to_string();

    if input.starts_with("enum") {
        let words = input.split(' ').collect::<Vec<_>>();

        let name = words.get(1).map_or(default_name, |w| w.to_string());
        let value = words.last().map_or(String::new(), |w| w.to_string());

        return (name, value);
    }

    let value = extract_field_name(input).unwrap_or_default();
    (default_name, value)
}
