use std::sync::Arc;

use tesserae_network::{
    Network, NetworkConfig, NetworkError, OutgoingRequest, RequestOptions, RetryConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NetworkConfig::from_env()?
        .with_retry(RetryConfig::default().with_max_retries(2).with_retry_delay_ms(250));

    let network = match std::env::var("NETWORK_TOKEN") {
        Ok(token) => Network::authenticated(config, token)?,
        Err(_) => Network::new(config),
    };

    network.add_request_interceptor(|request: OutgoingRequest| async move {
        println!("-> {} {}", request.method, request.url);
        Ok::<_, NetworkError>(request)
    });

    let network = Arc::new(network);

    match network
        .get("/users", Some(RequestOptions::new().param("page", 1)))
        .await
    {
        Ok(response) => println!("{} {:?}", response.status, response.body),
        Err(err) => match err.status() {
            Some(status) if status >= 500 => println!("server error, try again later"),
            Some(_) => println!("request failed: {err} {:?}", err.response()),
            None => return Err(err.into()),
        },
    }

    Ok(())
}
