//! Retry of JSON-RPC requests with exponential backoff.
//!
//! Only transient failures are retried, and never more often than the configured number of
//! retries. Everything else fails on the first attempt.

use std::time::Duration;

use alloy::{
    rpc::json_rpc::ErrorPayload,
    transports::{RpcError, TransportErrorKind},
};
use backoff::{exponential::ExponentialBackoffBuilder, ExponentialBackoff};
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::rpc::config::RPCRetryConfig;

const BACKOFF_MULTIPLIER: f64 = 2.0;

pub(crate) trait RpcErrorExt {
    /// Whether the failure is transient: rate limits, unavailable nodes, dropped or null
    /// responses and the JSON-RPC error codes nodes use for those.
    fn is_retryable(&self) -> bool;

    fn classify_error(self) -> backoff::Error<Self>
    where
        Self: Sized;
}

impl<E: std::borrow::Borrow<RawValue>> RpcErrorExt for RpcError<TransportErrorKind, E> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retry_err(),
            Self::DeserError { text, .. } => {
                // Some nodes answer errors without a valid JSON-RPC envelope.
                #[derive(Deserialize)]
                struct Envelope {
                    error: ErrorPayload,
                }

                serde_json::from_str::<ErrorPayload>(text)
                    .map(|payload| payload.is_retry_err())
                    .or_else(|_| {
                        serde_json::from_str::<Envelope>(text)
                            .map(|envelope| envelope.error.is_retry_err())
                    })
                    .unwrap_or(false)
            }
            Self::ErrorResp(err) => err.is_retry_err(),
            Self::NullResp => true,
            _ => false,
        }
    }

    fn classify_error(self) -> backoff::Error<Self> {
        if self.is_retryable() {
            backoff::Error::transient(self)
        } else {
            backoff::Error::permanent(self)
        }
    }
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    backoff: ExponentialBackoff,
    max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        (&RPCRetryConfig::default()).into()
    }
}

impl From<&RPCRetryConfig> for RetryPolicy {
    fn from(config: &RPCRetryConfig) -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(config.initial_backoff_ms))
            .with_multiplier(BACKOFF_MULTIPLIER)
            .with_max_interval(Duration::from_millis(config.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build();
        Self { backoff, max_retries: config.max_retries }
    }
}

impl From<RPCRetryConfig> for RetryPolicy {
    fn from(config: RPCRetryConfig) -> Self {
        (&config).into()
    }
}

impl From<&RetryPolicy> for RPCRetryConfig {
    fn from(policy: &RetryPolicy) -> Self {
        RPCRetryConfig {
            max_retries: policy.max_retries,
            initial_backoff_ms: policy.backoff.initial_interval.as_millis() as u64,
            max_backoff_ms: policy.backoff.max_interval.as_millis() as u64,
        }
    }
}

impl RetryPolicy {
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Policy with millisecond intervals.
    #[cfg(test)]
    pub(crate) fn for_testing(max_retries: usize) -> Self {
        (&RPCRetryConfig::new(max_retries, 1, 5)).into()
    }

    /// Runs `operation`, retrying transient failures with exponential backoff.
    ///
    /// The operation runs at most `max_retries + 1` times. The error of the last attempt is
    /// returned.
    pub(crate) async fn retry_request<F, Fut, T>(
        &self,
        mut operation: F,
    ) -> Result<T, RpcError<TransportErrorKind>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, RpcError<TransportErrorKind>>>,
    {
        let mut attempt = 0usize;
        backoff::future::retry(self.backoff.clone(), || {
            attempt += 1;
            let may_retry = attempt <= self.max_retries;
            let fut = operation();
            async move {
                fut.await.map_err(|err| {
                    if may_retry {
                        err.classify_error()
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use alloy::{rpc::client::ClientBuilder, transports::HttpError};
    use mockito::{Mock, ServerGuard};
    use serde::de::Error;

    use super::*;

    async fn mock_success(server: &mut ServerGuard) -> Mock {
        server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x10"}"#)
            .expect(1)
            .create_async()
            .await
    }

    async fn mock_unavailable(server: &mut ServerGuard, hits: usize) -> Mock {
        server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .expect(hits)
            .create_async()
            .await
    }

    #[test]
    fn test_retry_config_round_trip() {
        let config = RPCRetryConfig::new(5, 200, 8000);

        let policy = RetryPolicy::from(&config);

        assert_eq!(RPCRetryConfig::from(&policy), config);
        assert_eq!(policy.max_retries(), 5);
    }

    #[test]
    fn test_error_classification() {
        let unavailable =
            RpcError::<TransportErrorKind>::Transport(TransportErrorKind::HttpError(HttpError {
                status: 503,
                body: "".to_string(),
            }));
        let ser_err = RpcError::<TransportErrorKind>::SerError(serde_json::Error::custom("bad"));
        let reverted = RpcError::<TransportErrorKind>::ErrorResp(ErrorPayload {
            code: 3,
            message: "execution reverted".into(),
            data: None,
        });

        assert!(unavailable.is_retryable());
        assert!(RpcError::<TransportErrorKind>::NullResp.is_retryable());
        assert!(!ser_err.is_retryable());
        assert!(!reverted.is_retryable());
    }

    #[tokio::test]
    async fn test_retry_transient_then_succeed() {
        let mut server = mockito::Server::new_async().await;
        let _unavailable = mock_unavailable(&mut server, 2).await;
        let _success = mock_success(&mut server).await;
        let attempts = Arc::new(AtomicUsize::new(0));

        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let result = RetryPolicy::for_testing(3)
            .retry_request(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                client
                    .request_noparams::<String>("eth_blockNumber")
                    .await
            })
            .await;

        assert_eq!(result.unwrap(), "0x10");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let mut server = mockito::Server::new_async().await;
        let _unavailable = mock_unavailable(&mut server, 3).await;
        let attempts = Arc::new(AtomicUsize::new(0));

        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let result = RetryPolicy::for_testing(2)
            .retry_request(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                client
                    .request_noparams::<String>("eth_blockNumber")
                    .await
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_revert() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":0,"error":{"code":3,"message":"execution reverted"}}"#,
            )
            .expect(1)
            .create_async()
            .await;
        let attempts = Arc::new(AtomicUsize::new(0));

        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let result = RetryPolicy::for_testing(3)
            .retry_request(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                client
                    .request_noparams::<String>("eth_call")
                    .await
            })
            .await;

        assert!(matches!(result, Err(RpcError::ErrorResp(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
