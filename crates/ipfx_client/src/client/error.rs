use crate::chain::NodeError;
use crate::types::{AddressError, ArgumentError, TypeParseError};
use thiserror::Error;

/// Every failure the ledger client reports. No variant is retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no signer available")]
    SignerUnavailable,
    #[error("rejected by simulation: {vm_status}")]
    RejectedBySimulation { vm_status: String },
    #[error("network: {0}")]
    Network(NodeError),
    #[error("request timed out")]
    TimedOut,
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("config: {0}")]
    Config(String),
}

impl ClientError {
    /// Transient failures a caller may choose to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::TimedOut)
    }
}

impl From<NodeError> for ClientError {
    /// Context-free mapping; callers that know what a 404 or 400 means map those first.
    fn from(e: NodeError) -> Self {
        match e {
            NodeError::Timeout => ClientError::TimedOut,
            NodeError::Malformed(m) => ClientError::Decode(m),
            NodeError::InvalidUrl(m) => ClientError::Config(m),
            other => ClientError::Network(other),
        }
    }
}

impl From<ArgumentError> for ClientError {
    fn from(e: ArgumentError) -> Self {
        ClientError::InvalidArgument(e.to_string())
    }
}

impl From<TypeParseError> for ClientError {
    fn from(e: TypeParseError) -> Self {
        ClientError::InvalidArgument(e.to_string())
    }
}

impl From<AddressError> for ClientError {
    fn from(e: AddressError) -> Self {
        ClientError::InvalidArgument(e.to_string())
    }
}
