use std::{fmt, sync::Arc, time::Duration};

use reqwest::Method;

use crate::{
    body::encode_body,
    config::{parse_header, redacted_headers},
    endpoint::build_url,
    interceptor::InterceptorChain,
    response::{is_empty_response, parse_error_body, parse_success_body},
    signal, FormData, InterceptorHandle, NetworkConfig, NetworkError, NetworkResponse,
    OutgoingBody, OutgoingRequest, RequestBody, RequestInterceptor, RequestOptions,
    ResponseInterceptor, Result, RetryConfig,
};

/// Async HTTP client with timeouts, retries and interceptors.
///
/// Construct it once and share it (for example behind an [`Arc`]) with every
/// consumer. Configuration changes go through the `set_*` methods, which
/// need exclusive access.
pub struct Network {
    http: reqwest::Client,
    pub(crate) config: NetworkConfig,
    request_interceptors: InterceptorChain<dyn RequestInterceptor>,
    response_interceptors: InterceptorChain<dyn ResponseInterceptor>,
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("base_url", &self.config.base_url)
            .field("timeout_ms", &self.config.timeout_ms)
            .field("headers", &redacted_headers(&self.config.headers))
            .field("retry", &self.config.retry)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish()
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

impl Network {
    /// Creates a client from a base URL or a full [`NetworkConfig`].
    ///
    /// ```no_run
    /// use tesserae_network::{Network, NetworkConfig, RetryConfig};
    ///
    /// let simple = Network::new("https://api.example.com");
    /// let tuned = Network::new(
    ///     NetworkConfig::from("https://api.example.com")
    ///         .with_timeout_ms(5_000)
    ///         .with_retry(RetryConfig::default().with_max_retries(2)),
    /// );
    /// ```
    pub fn new(config: impl Into<NetworkConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.into(),
            request_interceptors: InterceptorChain::default(),
            response_interceptors: InterceptorChain::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// See [`NetworkConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self> {
        NetworkConfig::from_env().map(Self::new)
    }

    /// Replaces the underlying `reqwest` client, e.g. to tune pooling or TLS.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn set_base_url(&mut self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(NetworkError::configuration(
                "Base URL must be a non-empty string",
            ));
        }
        self.config.base_url = url;
        Ok(())
    }

    /// Adds or replaces a default header.
    pub fn set_header(&mut self, key: &str, value: &str) -> Result<()> {
        let (name, value) = parse_header(key, value)?;
        self.config.headers.insert(name, value);
        Ok(())
    }

    pub fn remove_header(&mut self, key: &str) {
        self.config.headers.remove(key);
    }

    pub fn set_retry_config(&mut self, retry: RetryConfig) {
        self.config.retry = retry;
    }

    /// Registers a request interceptor, applied after all earlier ones.
    pub fn add_request_interceptor<I>(&self, interceptor: I) -> InterceptorHandle
    where
        I: RequestInterceptor + 'static,
    {
        self.request_interceptors.register(Arc::new(interceptor))
    }

    /// Registers a response interceptor, applied after all earlier ones.
    pub fn add_response_interceptor<I>(&self, interceptor: I) -> InterceptorHandle
    where
        I: ResponseInterceptor + 'static,
    {
        self.response_interceptors.register(Arc::new(interceptor))
    }

    pub async fn get(&self, endpoint: &str, options: Option<RequestOptions>) -> Result<NetworkResponse> {
        self.request(endpoint, Method::GET, RequestBody::Empty, options)
            .await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        body: impl Into<RequestBody>,
        options: Option<RequestOptions>,
    ) -> Result<NetworkResponse> {
        self.request(endpoint, Method::POST, body.into(), options)
            .await
    }

    pub async fn put(
        &self,
        endpoint: &str,
        body: impl Into<RequestBody>,
        options: Option<RequestOptions>,
    ) -> Result<NetworkResponse> {
        self.request(endpoint, Method::PUT, body.into(), options)
            .await
    }

    pub async fn patch(
        &self,
        endpoint: &str,
        body: impl Into<RequestBody>,
        options: Option<RequestOptions>,
    ) -> Result<NetworkResponse> {
        self.request(endpoint, Method::PATCH, body.into(), options)
            .await
    }

    pub async fn delete(
        &self,
        endpoint: &str,
        options: Option<RequestOptions>,
    ) -> Result<NetworkResponse> {
        self.request(endpoint, Method::DELETE, RequestBody::Empty, options)
            .await
    }

    pub async fn head(&self, endpoint: &str, options: Option<RequestOptions>) -> Result<NetworkResponse> {
        self.request(endpoint, Method::HEAD, RequestBody::Empty, options)
            .await
    }

    pub async fn options(
        &self,
        endpoint: &str,
        options: Option<RequestOptions>,
    ) -> Result<NetworkResponse> {
        self.request(endpoint, Method::OPTIONS, RequestBody::Empty, options)
            .await
    }

    /// Posts a multipart form. The transport sets the boundary-bearing
    /// `Content-Type`.
    pub async fn upload(
        &self,
        endpoint: &str,
        form: FormData,
        options: Option<RequestOptions>,
    ) -> Result<NetworkResponse> {
        self.request(endpoint, Method::POST, RequestBody::Form(form), options)
            .await
    }

    async fn request(
        &self,
        endpoint: &str,
        method: Method,
        body: RequestBody,
        options: Option<RequestOptions>,
    ) -> Result<NetworkResponse> {
        let options = options.unwrap_or_default();
        let retry = &self.config.retry;
        let max_retries = options.retries.unwrap_or(retry.max_retries);
        let mut attempt = 0usize;

        loop {
            let error = match self.execute(endpoint, &method, &body, &options).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !retry.should_retry_request(&error, attempt, max_retries) {
                return Err(error);
            }

            let delay = retry.backoff_delay(attempt);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                status = ?error.status(),
                attempt = attempt + 1,
                max_retries,
                "retrying {} {} after {} ms",
                method,
                endpoint,
                delay.as_millis()
            );

            if !signal::sleep_unless_cancelled(delay, options.signal.as_ref()).await {
                return Err(NetworkError::Timeout);
            }
            attempt += 1;
        }
    }

    async fn execute(
        &self,
        endpoint: &str,
        method: &Method,
        body: &RequestBody,
        options: &RequestOptions,
    ) -> Result<NetworkResponse> {
        let url = build_url(&self.config.base_url, endpoint, options.params.as_deref())?;

        let mut headers = self.config.headers.clone();
        for (key, value) in &options.headers {
            let (name, value) = parse_header(key, value)?;
            headers.insert(name, value);
        }

        let timeout_ms = options
            .timeout_ms
            .filter(|timeout_ms| *timeout_ms > 0)
            .unwrap_or_else(|| self.config.effective_timeout_ms());

        let body = encode_body(method, body.clone(), &mut headers)?;
        let request = OutgoingRequest {
            method: method.clone(),
            url,
            headers,
            body,
        };
        let request = self.request_interceptors.apply(request).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!("dispatching {} {}", request.method, request.url);

        let response = signal::guard(
            self.dispatch(request),
            Duration::from_millis(timeout_ms),
            options.signal.as_ref(),
        )
        .await?;

        self.response_interceptors.apply(response).await
    }

    async fn dispatch(&self, request: OutgoingRequest) -> Result<NetworkResponse> {
        let OutgoingRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.http.request(method, url.as_str()).headers(headers);
        builder = match body {
            Some(OutgoingBody::Text(text)) => builder.body(text),
            Some(OutgoingBody::Form(form)) => builder.multipart(form.to_multipart()?),
            None => builder,
        };

        let response = builder.send().await.map_err(|err| {
            #[cfg(feature = "tracing")]
            tracing::warn!("request to {} failed: {}", url, err);
            NetworkError::from_transport(err)
        })?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_owned();
        let headers = response.headers().clone();
        let ok = (self.config.validate_status)(status);

        if !ok {
            let body = response
                .text()
                .await
                .ok()
                .map(|text| parse_error_body(&text));
            return Err(NetworkError::Http {
                status,
                status_text,
                response: body,
            });
        }

        if is_empty_response(status, &headers) {
            return Ok(NetworkResponse {
                status,
                ok,
                status_text,
                headers,
                body: None,
            });
        }

        // A body that fails to arrive is reported as absent.
        let text = response.text().await.ok();
        Ok(NetworkResponse {
            status,
            ok,
            status_text,
            headers,
            body: text.as_deref().and_then(parse_success_body),
        })
    }
}
