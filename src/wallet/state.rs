//! WalletState and the connect state machine

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::provider::{Signer, WalletProvider};

/// Connect state machine. `Connecting` is the in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

/// Session wallet state. `is_connected()` is derived from the address, so
/// `connected == true` iff `address.is_some()` holds for every value of this type.
#[derive(Clone)]
pub struct WalletState {
    address: Option<String>,
    balance: String,
    chain_id: Option<u64>,
    provider: Option<Arc<dyn WalletProvider>>,
    signer: Option<Signer>,
}

/// Serializable view of a WalletState (no handles)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub address: Option<String>,
    pub connected: bool,
    pub balance: String,
    pub chain_id: Option<u64>,
}

const EMPTY_BALANCE: &str = "0";

impl WalletState {
    pub fn empty() -> Self {
        Self { address: None, balance: EMPTY_BALANCE.into(), chain_id: None, provider: None, signer: None }
    }

    pub(crate) fn new_connected(
        address: String,
        balance: String,
        chain_id: u64,
        provider: Arc<dyn WalletProvider>,
        signer: Signer,
    ) -> Self {
        Self { address: Some(address), balance, chain_id: Some(chain_id), provider: Some(provider), signer: Some(signer) }
    }

    pub fn address(&self) -> Option<&str> { self.address.as_deref() }
    pub fn is_connected(&self) -> bool { self.address.is_some() }
    /// Ether balance, fixed fraction digits
    pub fn balance(&self) -> &str { &self.balance }
    pub fn chain_id(&self) -> Option<u64> { self.chain_id }
    pub fn provider(&self) -> Option<&Arc<dyn WalletProvider>> { self.provider.as_ref() }
    pub fn signer(&self) -> Option<&Signer> { self.signer.as_ref() }

    pub fn is_empty(&self) -> bool { *self == Self::empty() }

    pub(crate) fn set_chain_id(&mut self, chain_id: u64) { self.chain_id = Some(chain_id); }
    pub(crate) fn set_balance(&mut self, balance: String) { self.balance = balance; }

    pub fn snapshot(&self) -> WalletSnapshot {
        WalletSnapshot {
            address: self.address.clone(),
            connected: self.is_connected(),
            balance: self.balance.clone(),
            chain_id: self.chain_id,
        }
    }
}

impl Default for WalletState {
    fn default() -> Self { Self::empty() }
}

impl PartialEq for WalletState {
    fn eq(&self, other: &Self) -> bool {
        let same_provider = match (&self.provider, &other.provider) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.address == other.address
            && self.balance == other.balance
            && self.chain_id == other.chain_id
            && same_provider
            && self.signer.as_ref().map(Signer::address) == other.signer.as_ref().map(Signer::address)
    }
}

impl fmt::Debug for WalletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletState")
            .field("address", &self.address)
            .field("connected", &self.is_connected())
            .field("balance", &self.balance)
            .field("chain_id", &self.chain_id)
            .field("provider", &self.provider.is_some())
            .field("signer", &self.signer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_is_disconnected() {
        let state = WalletState::default();
        assert!(state.is_empty());
        assert!(!state.is_connected());
        assert_eq!(state.address(), None);
        assert_eq!(state.balance(), "0");
        assert_eq!(state.chain_id(), None);
        assert!(state.provider().is_none() && state.signer().is_none());

        let snapshot = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(snapshot["connected"], false);
        assert_eq!(snapshot["chainId"], serde_json::Value::Null);
    }

    #[test]
    fn status_names() {
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Idle);
        assert_eq!(ConnectionStatus::Connecting.as_str(), "connecting");
    }
}
