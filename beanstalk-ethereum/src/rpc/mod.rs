use std::time::Duration;

use alloy::{
    primitives::{Address, Bytes},
    rpc::{
        client::{ClientBuilder, ReqwestClient},
        types::{BlockNumberOrTag, TransactionInput, TransactionRequest},
    },
    transports::http::reqwest,
};
use tracing::instrument;

pub mod config;
pub mod errors;
pub mod quoter;
mod retry;

use crate::rpc::{
    config::RPCRetryConfig,
    errors::{RPCError, RequestError},
    retry::RetryPolicy,
};

/// Wraps the ReqwestClient with the Ethereum calls needed for quoting and retry logic.
/// Cheap to clone, the inner client is reference counted.
#[derive(Clone, Debug)]
pub struct EthereumRpcClient {
    inner: ReqwestClient,
    retry_policy: RetryPolicy,
    url: String,
}

impl EthereumRpcClient {
    /// Creates a client for the given RPC URL with the default retry configuration
    /// (3 retries, 100ms initial backoff, 5000ms max backoff).
    pub fn new(rpc_url: &str) -> Result<Self, RPCError> {
        let url = rpc_url
            .parse()
            .map_err(|e| RPCError::SetupError(format!("Invalid RPC URL: {e}")))?;

        let http_client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RPCError::SetupError(format!("Failed to create HTTP client: {e}")))?;

        let inner = ClientBuilder::default().http_with_client(http_client, url);

        Ok(Self { inner, retry_policy: RetryPolicy::default(), url: rpc_url.to_string() })
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }

    pub fn get_retry_config(&self) -> RPCRetryConfig {
        (&self.retry_policy).into()
    }

    pub fn with_retry(mut self, retry_config: RPCRetryConfig) -> Self {
        self.retry_policy = retry_config.into();
        self
    }

    /// Executes a read-only message call against `to` at `block`.
    /// See https://ethereum.org/en/developers/docs/apis/json-rpc/#eth_call
    #[instrument(level = "debug", skip(self, calldata))]
    pub async fn eth_call(
        &self,
        to: Address,
        calldata: Bytes,
        block: BlockNumberOrTag,
    ) -> Result<Bytes, RPCError> {
        let request = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(calldata));

        let output: Bytes = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_call", (&request, block))
                    .await
            })
            .await
            .map_err(|e| {
                RPCError::from_alloy(format!("Failed to send an eth_call to {to} at {block}"), e)
            })?;

        if output.is_empty() {
            return Err(RPCError::RequestError(RequestError::Other(format!(
                "eth_call to {to} returned no data, is it a contract?"
            ))));
        }
        Ok(output)
    }
}
