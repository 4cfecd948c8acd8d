use crate::error::{AppError, AppResult};
use crate::models::EgressBinding;
use reqwest::{Client, Proxy};
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 20;

fn base_builder(timeout: Duration) -> reqwest::ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
}

/// Builds the client an identity uses for every request. Direct bindings
/// ignore proxy environment variables so the reported IP matches the
/// actual egress.
pub fn build_client(binding: &EgressBinding, timeout: Duration) -> AppResult<Client> {
    let builder = match binding.proxy_url() {
        Some(url) => {
            let proxy = Proxy::all(&url)
                .map_err(|e| AppError::Config(format!("invalid_proxy_url: {}: {}", url, e)))?;
            tracing::debug!("[Http] Route: {} -> Proxy {}", binding.reported_ip(), url);
            base_builder(timeout).proxy(proxy)
        }
        None => {
            tracing::debug!("[Http] Route: {} -> Direct", binding.reported_ip());
            base_builder(timeout).no_proxy()
        }
    };

    builder.build().map_err(AppError::from)
}
