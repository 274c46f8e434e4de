use reqwest::Client;
use std::time::Duration;

/// Generation calls can run long; searches should fail fast.
const GENERATION_TIMEOUT_SECS: u64 = 120;
const SEARCH_TIMEOUT_SECS: u64 = 30;

pub fn generation_client() -> Client {
    build_client(GENERATION_TIMEOUT_SECS)
}

pub fn search_client() -> Client {
    build_client(SEARCH_TIMEOUT_SECS)
}

fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}
