//! `tesserae-network` is a reusable async HTTP request layer.
//!
//! A single [`Network`] client provides:
//! - URL construction from a base URL, endpoint and query parameters
//! - per-call timeouts composed with caller cancellation
//! - retry with exponential backoff and jitter ([`RetryConfig`])
//! - ordered, removable request/response interceptors
//! - one error type, [`NetworkError`], for transport failures, timeouts and
//!   rejected statuses
//!
//! ```no_run
//! use tesserae_network::Network;
//!
//! # async fn run() -> tesserae_network::Result<()> {
//! let network = Network::new("https://api.example.com");
//! let user = network.get("/users/42", None).await?;
//! println!("{} {:?}", user.status, user.body);
//! # Ok(())
//! # }
//! ```

mod auth;
mod body;
mod client;
mod config;
mod endpoint;
mod error;
mod interceptor;
mod request;
mod response;
mod retry;
mod signal;

pub use body::{FormData, FormPart, OutgoingBody, RequestBody};
pub use client::Network;
pub use config::{default_headers, NetworkConfig, StatusValidator, DEFAULT_TIMEOUT_MS};
pub use endpoint::build_url;
pub use error::NetworkError;
pub use interceptor::{InterceptorHandle, RequestInterceptor, ResponseInterceptor};
pub use request::{OutgoingRequest, QueryValue, RequestOptions};
pub use response::{NetworkResponse, ResponseBody};
pub use retry::{RetryConfig, RetryPredicate, DEFAULT_RETRY_STATUSES};

pub use reqwest::{header, Method};
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, NetworkError>;
