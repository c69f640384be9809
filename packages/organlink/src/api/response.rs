//! Decoding of OrganLink API response envelopes.
//!
//! The API is not consistent about its envelopes:
//!
//!   non-2xx             error, message from the `error` or `message` field
//!   `success: false`    error, message from the `error` or `message` field
//!   anything else       the payload
//!
//! List endpoints return either a bare array or an object holding the array under
//! one of `requests`, `matches`, `notifications` or `data`.

use super::ApiResponse;
use crate::error::{ApiError, Error};
use crate::log::API;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

const LIST_KEYS: [&str; 4] = ["requests", "matches", "notifications", "data"];

const REJECTED_MESSAGE: &str = "The request was not successful";

///
/// Body of endpoints that only acknowledge an action
///
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

pub fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, Error> {
    let value = decode_value(response)?;
    let decoded = serde_json::from_value(value).map_err(ApiError::Decode)?;
    Ok(decoded)
}

pub fn decode_ack(response: &ApiResponse) -> Result<Ack, Error> {
    let value = decode_value(response)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

///
/// Decodes a list payload. Items that do not deserialize are skipped with a warning.
///
pub fn decode_list<T: DeserializeOwned>(response: &ApiResponse) -> Result<Vec<T>, Error> {
    let items = match decode_value(response)? {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            let items = LIST_KEYS.iter().find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            });

            items.unwrap_or_else(|| {
                debug!(target: API, msg = "List payload has no recognised list field");
                Vec::new()
            })
        }
        _ => Vec::new(),
    };

    let decoded = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(target: API, msg = "Skipping malformed list item", error = err.to_string());
                None
            }
        })
        .collect();

    Ok(decoded)
}

fn decode_value(response: &ApiResponse) -> Result<Value, Error> {
    let value = match parse_body(&response.body) {
        Ok(value) => value,
        Err(err) if response.is_success() => return Err(ApiError::Decode(err).into()),
        // Error pages are often HTML
        Err(_) => Value::Null,
    };

    if !response.is_success() {
        return Err(ApiError::Status {
            status: response.status,
            message: server_message(&value),
        }
        .into());
    }

    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = server_message(&value).unwrap_or_else(|| REJECTED_MESSAGE.to_string());
        return Err(ApiError::Rejected { message }.into());
    }

    Ok(value)
}

fn parse_body(body: &str) -> Result<Value, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
}

fn server_message(value: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .find(|message| !message.trim().is_empty())
        .map(str::to_string)
}
