use serde_json::Value as JsonValue;

/// Error type returned by this crate.
///
/// Every failed call ends in exactly one of these variants. Callers usually
/// branch on [`NetworkError::status`] and inspect [`NetworkError::response`]
/// for the server-supplied error body.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Caller misuse, such as an empty base URL or an invalid header.
    #[error("{0}")]
    Configuration(String),
    /// The request never reached a server (DNS, connection refused, offline).
    #[error("Network request failed: {message}")]
    Transport { message: String },
    /// The timeout elapsed or the caller's cancellation token fired.
    #[error("Request timeout")]
    Timeout,
    /// Server responded with a status rejected by the status validator.
    #[error("Request failed with status {status}")]
    Http {
        status: u16,
        status_text: String,
        /// Parsed error body, if one could be read.
        response: Option<JsonValue>,
    },
    /// Response body could not be converted into the requested type.
    #[error("decode error: {0}")]
    Decode(String),
}

impl NetworkError {
    /// HTTP-like status of the failure.
    ///
    /// `0` means no response was obtained, `408` means the call timed out or
    /// was cancelled. Configuration and decode errors have no status.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { .. } => Some(0),
            Self::Timeout => Some(408),
            Self::Http { status, .. } => Some(*status),
            Self::Configuration(_) | Self::Decode(_) => None,
        }
    }

    pub fn status_text(&self) -> &str {
        match self {
            Self::Transport { .. } => "Network Error",
            Self::Timeout => "Request Timeout",
            Self::Http { status_text, .. } => status_text,
            Self::Configuration(_) => "Configuration Error",
            Self::Decode(_) => "Decode Error",
        }
    }

    /// Parsed error body returned by the server, if any.
    pub fn response(&self) -> Option<&JsonValue> {
        match self {
            Self::Http { response, .. } => response.as_ref(),
            _ => None,
        }
    }

    /// Returns `true` when the error came from the transport boundary or the
    /// server, as opposed to caller misuse.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout | Self::Http { .. }
        )
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        Self::Transport {
            message: err.to_string(),
        }
    }
}
