//! Classification of raw server responses.
//!
//! The slide server answers with one of three shapes:
//!
//! - a JSON object, which either carries an error (`Code` + `Message`),
//!   a legacy single-letter payload field (`d`), or the payload itself
//! - a JSON array
//! - a bare scalar, which older servers return without any wrapping
//!   (`true`, an unquoted version string, a quoted UID)
//!
//! This module only looks at text that was already fetched.

use serde_json::{Map, Value};

use crate::error::ClientError;

/// Field carrying the server's error code.
const ERROR_CODE_FIELD: &str = "Code";

/// Field carrying the server's error message.
const ERROR_MESSAGE_FIELD: &str = "Message";

/// Legacy payload wrapper field.
const PAYLOAD_FIELD: &str = "d";

/// The shape of a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Object(Map<String, Value>),
    Array(Vec<Value>),
    Scalar(String),
}

/// Determine the shape of a raw response body.
pub fn classify(body: &str) -> ResponseBody {
    let trimmed = body.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => return ResponseBody::Object(map),
            Ok(Value::Array(items)) => return ResponseBody::Array(items),
            _ => {}
        }
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(s)) => ResponseBody::Scalar(s),
        Ok(Value::Null) => ResponseBody::Scalar(String::new()),
        Ok(Value::Bool(b)) => ResponseBody::Scalar(b.to_string()),
        Ok(Value::Number(n)) => ResponseBody::Scalar(n.to_string()),
        // Unquoted text from legacy servers
        _ => ResponseBody::Scalar(trimmed.replace('"', "")),
    }
}

impl ResponseBody {
    /// Convert an already-parsed JSON value into a response shape.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => ResponseBody::Object(map),
            Value::Array(items) => ResponseBody::Array(items),
            Value::String(s) => ResponseBody::Scalar(s),
            Value::Null => ResponseBody::Scalar(String::new()),
            other => ResponseBody::Scalar(other.to_string()),
        }
    }

    /// Surface server-signalled failures and strip the legacy `d` wrapper.
    ///
    /// `context` names the call in the resulting error message.
    pub fn into_payload(self, context: &str) -> Result<ResponseBody, ClientError> {
        match self {
            ResponseBody::Object(mut map) => {
                if map.contains_key(ERROR_CODE_FIELD) {
                    let message = match map.remove(ERROR_MESSAGE_FIELD) {
                        Some(Value::String(s)) => s,
                        Some(other) => other.to_string(),
                        None => "unknown error".to_string(),
                    };
                    return Err(ClientError::Server {
                        context: context.to_string(),
                        message,
                    });
                }
                match map.remove(PAYLOAD_FIELD) {
                    Some(payload) => Ok(ResponseBody::from_value(payload)),
                    None => Ok(ResponseBody::Object(map)),
                }
            }
            other => Ok(other),
        }
    }

    /// Whether this is the bare scalar `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, ResponseBody::Scalar(s) if s.eq_ignore_ascii_case("true"))
    }

    /// Interpret the payload as a list of strings.
    pub fn into_strings(self, context: &str) -> Result<Vec<String>, ClientError> {
        match self {
            ResponseBody::Array(items) => Ok(items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect()),
            ResponseBody::Object(_) => Err(ClientError::unexpected(context, "expected a list, got an object")),
            ResponseBody::Scalar(s) => Err(ClientError::unexpected(
                context,
                format!("expected a list, got '{}'", s),
            )),
        }
    }

    /// Interpret the payload as a list of JSON values.
    pub fn into_array(self, context: &str) -> Result<Vec<Value>, ClientError> {
        match self {
            ResponseBody::Array(items) => Ok(items),
            _ => Err(ClientError::unexpected(context, "expected a list")),
        }
    }

    /// Interpret the payload as a JSON object.
    pub fn into_object(self, context: &str) -> Result<Map<String, Value>, ClientError> {
        match self {
            ResponseBody::Object(map) => Ok(map),
            _ => Err(ClientError::unexpected(context, "expected an object")),
        }
    }

    /// Interpret the payload as a scalar string.
    pub fn into_scalar(self, context: &str) -> Result<String, ClientError> {
        match self {
            ResponseBody::Scalar(s) => Ok(s),
            _ => Err(ClientError::unexpected(context, "expected a scalar value")),
        }
    }
}
