use std::fmt::Display;

use alloy::transports::{RpcError as AlloyRpcError, TransportErrorKind};
use beanstalk_common::traits::QuoteError;
use thiserror::Error;

use crate::rpc::retry::RpcErrorExt;

pub(crate) type AlloyError = AlloyRpcError<TransportErrorKind>;

#[derive(Error, Debug)]
pub struct ReqwestError {
    pub msg: String,
    #[source]
    pub source: AlloyError,
}

impl Display for ReqwestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.msg, self.source)
    }
}

#[derive(Error, Debug)]
pub enum RequestError {
    Reqwest(ReqwestError),
    Other(String),
}

impl Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Reqwest(e) => write!(f, "{e}"),
            RequestError::Other(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RPCError {
    #[error("RPC setup error: {0}")]
    SetupError(String),
    #[error("Request error: {0}")]
    RequestError(RequestError),
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl RPCError {
    pub(crate) fn from_alloy<S: ToString>(msg: S, error: AlloyError) -> Self {
        RPCError::RequestError(RequestError::Reqwest(ReqwestError {
            msg: msg.to_string(),
            source: error,
        }))
    }

    /// Whether asking again later may succeed. Only transport level failures qualify, reverts
    /// and malformed responses do not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RPCError::RequestError(RequestError::Reqwest(e)) => e.source.is_retryable(),
            _ => false,
        }
    }
}

impl From<RPCError> for QuoteError {
    fn from(error: RPCError) -> Self {
        if error.is_recoverable() {
            QuoteError::Recoverable(error.to_string())
        } else {
            QuoteError::Fatal(error.to_string())
        }
    }
}
