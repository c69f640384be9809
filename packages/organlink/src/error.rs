use crate::model::RequestStatus;
use crate::session::Portal;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Match request cannot move from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Could not reach the OrganLink API: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{}", status_message(*status, message.as_deref()))]
    Status { status: u16, message: Option<String> },

    #[error("{message}")]
    Rejected { message: String },

    #[error("Unexpected response from the OrganLink API: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API url {url}")]
    InvalidUrl { url: String },

    #[error("Could not determine the match request for {item}")]
    MissingIdentifier { item: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API base url {url} is not a valid url")]
    InvalidBaseUrl { url: String },

    #[error("Invalid value {value} for {name}")]
    InvalidParameter { name: String, value: String },

    #[error("Missing field {name} from configuration file or environment")]
    MissingParameter { name: String },

    #[error(transparent)]
    FileOrEnvironment(#[from] config::ConfigError),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not signed in to the {portal} portal")]
    NotAuthenticated { portal: Portal },

    #[error("Token store could not be read: {0}")]
    Store(#[from] serde_json::Error),
}

fn status_message(status: u16, message: Option<&str>) -> String {
    match message {
        Some(message) if !message.trim().is_empty() => message.to_string(),
        _ => format!("Request failed with status {status}"),
    }
}

impl Error {
    ///
    /// Text shown to the user when an action fails.
    ///
    /// Network failures get a generic message, server supplied messages are passed through.
    ///
    pub fn user_message(&self) -> String {
        match self {
            Error::Api(ApiError::Network(_)) => {
                "Network error. Please check your connection and try again".to_string()
            }
            Error::Api(ApiError::Decode(_)) => "Unexpected response from the server".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Api(e.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Api(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_server_message() {
        let err: Error = ApiError::Status {
            status: 409,
            message: Some("Request already exists for this donor".to_string()),
        }
        .into();

        assert_eq!(err.user_message(), "Request already exists for this donor");
    }

    #[test]
    fn status_error_falls_back_to_status_code() {
        let err: Error = ApiError::Status {
            status: 500,
            message: None,
        }
        .into();
        assert_eq!(err.user_message(), "Request failed with status 500");

        let err: Error = ApiError::Status {
            status: 502,
            message: Some("  ".to_string()),
        }
        .into();
        assert_eq!(err.user_message(), "Request failed with status 502");
    }

    #[test]
    fn rejected_error_uses_server_message() {
        let err: Error = ApiError::Rejected {
            message: "Patient already has an active request".to_string(),
        }
        .into();
        assert_eq!(err.user_message(), "Patient already has an active request");
    }
}
