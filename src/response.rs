use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};

use crate::{NetworkError, Result};

/// Parsed response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    /// Body text was valid JSON.
    Json(JsonValue),
    /// Body text that did not parse as JSON, kept as-is.
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

/// Normalized successful response.
#[derive(Clone, Debug)]
pub struct NetworkResponse {
    pub status: u16,
    /// Result of the client's status validator for `status`.
    pub ok: bool,
    pub status_text: String,
    pub headers: HeaderMap,
    /// `None` for 204, `content-length: 0`, or an empty body.
    pub body: Option<ResponseBody>,
}

impl NetworkResponse {
    /// Deserializes a JSON body into `T`.
    ///
    /// A missing body is treated as JSON `null`; text bodies are tried as a
    /// JSON string.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let value = match &self.body {
            Some(ResponseBody::Json(value)) => value.clone(),
            Some(ResponseBody::Text(text)) => JsonValue::String(text.clone()),
            None => JsonValue::Null,
        };
        serde_json::from_value(value)
            .map_err(|err| NetworkError::Decode(format!("response body does not match: {err}")))
    }

    /// Consuming variant of [`NetworkResponse::json`].
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        let value = match self.body {
            Some(ResponseBody::Json(value)) => value,
            Some(ResponseBody::Text(text)) => JsonValue::String(text),
            None => JsonValue::Null,
        };
        serde_json::from_value(value)
            .map_err(|err| NetworkError::Decode(format!("response body does not match: {err}")))
    }
}

/// `true` when the body must not be read: 204, or `content-length: 0`.
pub(crate) fn is_empty_response(status: u16, headers: &HeaderMap) -> bool {
    status == 204
        || headers
            .get(header::CONTENT_LENGTH)
            .is_some_and(|value| value.as_bytes() == b"0")
}

pub(crate) fn parse_success_body(text: &str) -> Option<ResponseBody> {
    if text.is_empty() {
        return None;
    }
    Some(match serde_json::from_str::<JsonValue>(text) {
        Ok(value) => ResponseBody::Json(value),
        Err(_) => ResponseBody::Text(text.to_owned()),
    })
}

/// Error bodies fall back to `{"message": <text>}` when not JSON.
pub(crate) fn parse_error_body(text: &str) -> JsonValue {
    serde_json::from_str::<JsonValue>(text).unwrap_or_else(|_| json!({ "message": text }))
}
