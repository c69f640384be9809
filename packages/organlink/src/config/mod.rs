mod api;
mod log;
mod organlink;

pub use api::ApiConfig;
pub use log::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use organlink::{NotificationConfig, OrganLinkConfig, PrometheusConfig, SessionConfig};

pub const OL_PREFIX: &str = "OL";
pub const DEFAULT_CONFIG_FILE_PATH: &str = "organlink.toml";

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

// 30 seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 1000 * 30;

// Seconds between notification polls
pub const DEFAULT_POLL_INTERVAL: u64 = 30;

pub const DEFAULT_TOKEN_FILE: &str = ".organlink/tokens.json";
