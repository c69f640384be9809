pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod feedback;
pub mod log;
pub mod matching;
pub mod model;
pub mod notify;
pub mod prometheus;
pub mod session;

pub use crate::api::ApiClient;
pub use crate::cli::Args;
pub use crate::config::OrganLinkConfig;
pub use crate::log::init;
pub use crate::matching::MatchingWorkspace;
pub use crate::notify::{NotificationCenter, NotificationPoller};
pub use crate::session::{Portal, Session};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
pub mod test_helpers;
