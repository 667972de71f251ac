use reqwest::header::{self, HeaderValue};

use crate::{Network, NetworkConfig, NetworkError, Result};

impl Network {
    /// Creates a client that sends `Authorization: Token <token>` with every
    /// request.
    ///
    /// A token that already carries a scheme (`"Bearer abc"`) is kept as-is.
    pub fn authenticated(config: impl Into<NetworkConfig>, token: impl AsRef<str>) -> Result<Self> {
        let mut network = Self::new(config);
        network.set_auth_token(token)?;
        Ok(network)
    }

    /// Sets the `Authorization` default header from a token.
    pub fn set_auth_token(&mut self, token: impl AsRef<str>) -> Result<()> {
        let authorization = normalize_token_authorization(token.as_ref()).ok_or_else(|| {
            NetworkError::configuration("authorization token must be a non-empty string")
        })?;
        let mut value = HeaderValue::from_str(&authorization).map_err(|_| {
            NetworkError::configuration("authorization token contains invalid characters")
        })?;
        value.set_sensitive(true);
        self.config.headers.insert(header::AUTHORIZATION, value);
        Ok(())
    }

    pub fn clear_auth_token(&mut self) {
        self.config.headers.remove(header::AUTHORIZATION);
    }
}

fn normalize_token_authorization(token: &str) -> Option<String> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.contains(char::is_whitespace) {
        Some(trimmed.to_owned())
    } else {
        Some(format!("Token {trimmed}"))
    }
}
