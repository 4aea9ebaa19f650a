use crate::types::ProbeConfig;
use reqwest::Client;
use std::time::Duration;

pub fn create_http_pool(config: &ProbeConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_write_timeout)
        .timeout(config.request_timeout())
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_nodelay(true)
        .use_rustls_tls()
        .build()
}
