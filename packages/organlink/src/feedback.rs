use crate::error::Error;
use crate::log::MATCHING;
use std::fmt::Display;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

///
/// A short user-facing message produced by an action, shown as a toast in the portal UI
/// and printed by the CLI.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub level: Level,
    pub message: String,
}

impl Feedback {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    pub fn from_error(err: &Error) -> Self {
        Self::error(err.user_message())
    }

    fn new(level: Level, message: impl Into<String>) -> Self {
        Feedback {
            level,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    pub fn log(&self) {
        match self.level {
            Level::Success | Level::Info => info!(target: MATCHING, msg = %self.message),
            Level::Warning | Level::Error => warn!(target: MATCHING, msg = %self.message),
        }
    }
}

impl Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            Level::Success => "✓",
            Level::Info => "i",
            Level::Warning => "!",
            Level::Error => "✗",
        };
        write!(f, "{prefix} {}", self.message)
    }
}
