use std::fmt;

use reqwest::{header::HeaderMap, Method};
use tokio_util::sync::CancellationToken;

use crate::OutgoingBody;

/// Per-call overrides. Every field is optional.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Merged over the client's default headers; these win on collision.
    pub headers: Vec<(String, String)>,
    /// Overrides the client timeout for this call.
    pub timeout_ms: Option<u64>,
    /// External cancellation, composed with the internal timeout.
    pub signal: Option<CancellationToken>,
    /// Query parameters in insertion order.
    pub params: Option<Vec<(String, String)>>,
    /// Overrides the policy's `max_retries` for this call.
    pub retries: Option<usize>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }

    /// Appends a query parameter. Keys may repeat.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into().to_string()));
        self
    }

    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = Some(retries);
        self
    }
}

/// Primitive query parameter value, coerced to a string in the URL.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Fully resolved request handed to request interceptors and then to the
/// transport.
#[derive(Clone, Debug)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<OutgoingBody>,
}
