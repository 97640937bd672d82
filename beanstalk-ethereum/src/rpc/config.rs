use serde::Deserialize;

/// Retry behaviour for JSON-RPC requests.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RPCRetryConfig {
    /// Retries after the first failed attempt (default: 3)
    pub max_retries: usize,
    /// Delay before the first retry, in milliseconds (default: 100ms)
    pub initial_backoff_ms: u64,
    /// Upper bound for the delay between retries, in milliseconds (default: 5000ms)
    pub max_backoff_ms: u64,
}

impl RPCRetryConfig {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self { max_retries, initial_backoff_ms, max_backoff_ms }
    }

    /// Config that never retries.
    pub fn disabled() -> Self {
        Self { max_retries: 0, ..Default::default() }
    }
}

impl Default for RPCRetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, initial_backoff_ms: 100, max_backoff_ms: 5000 }
    }
}
