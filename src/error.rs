//! Error taxonomy for the session, stats and storage layers

use thiserror::Error;

/// Provider error codes (EIP-1193 / MetaMask)
pub mod codes {
    pub const USER_REJECTED: i64 = 4001;
    pub const REQUEST_PENDING: i64 = -32002;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
}

/// Error raised by a wallet provider call. `code` is the numeric provider code, if any.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code: Some(code), message: message.into() }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    pub fn is_user_rejected(&self) -> bool { self.code == Some(codes::USER_REJECTED) }
    pub fn is_request_pending(&self) -> bool { self.code == Some(codes::REQUEST_PENDING) }
    pub fn is_unrecognized_chain(&self) -> bool { self.code == Some(codes::UNRECOGNIZED_CHAIN) }
}

/// Wallet session errors. Surfaced to the caller and retained in session error state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no wallet provider available, install a wallet extension")]
    ProviderMissing,
    #[error("user rejected the wallet connection")]
    UserRejected,
    #[error("a connection request is already pending, check the wallet")]
    RequestPending,
    #[error("wallet not connected")]
    NotConnected,
    #[error("unsupported network: chain id {0}")]
    UnsupportedNetwork(u64),
    #[error("failed to add network: {0}")]
    AddNetworkFailed(String),
    #[error("failed to switch network: {0}")]
    SwitchFailed(String),
    #[error("{0}")]
    Provider(String),
}

impl From<ProviderError> for SessionError {
    fn from(e: ProviderError) -> Self {
        if e.is_user_rejected() {
            SessionError::UserRejected
        } else if e.is_request_pending() {
            SessionError::RequestPending
        } else {
            SessionError::Provider(e.message)
        }
    }
}

/// Contract binding errors. `Unsupported` means the feature is absent, not broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("contract method not supported: {0}")]
    Unsupported(&'static str),
    #[error("contract call failed: {0}")]
    Call(String),
}

/// Stats aggregation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("failed to fetch user stats: {0}")]
    AggregationFailed(String),
}

/// Durable storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
pub type StatsResult<T> = Result<T, StatsError>;
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_map_to_session_errors() {
        assert_eq!(SessionError::from(ProviderError::new(4001, "denied")), SessionError::UserRejected);
        assert_eq!(SessionError::from(ProviderError::new(-32002, "busy")), SessionError::RequestPending);
        assert_eq!(
            SessionError::from(ProviderError::new(-32603, "internal")),
            SessionError::Provider("internal".into())
        );
        assert_eq!(SessionError::from(ProviderError::other("boom")), SessionError::Provider("boom".into()));
    }
}
