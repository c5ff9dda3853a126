//! WalletProvider - the injected wallet capability (EIP-1193 shaped)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::ProviderError;

/// Notifications pushed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// `accountsChanged`: empty when the user revoked access
    AccountsChanged(Vec<String>),
    /// `chainChanged`
    ChainChanged(u64),
}

/// `nativeCurrency` block of `wallet_addEthereumChain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameters of `wallet_addEthereumChain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_explorer_urls: Vec<String>,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`: may prompt the user
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;
    /// `eth_accounts`: accounts already authorized, never prompts
    async fn accounts(&self) -> Result<Vec<String>, ProviderError>;
    async fn chain_id(&self) -> Result<u64, ProviderError>;
    /// Balance in wei
    async fn balance(&self, address: &str) -> Result<u128, ProviderError>;
    /// `wallet_switchEthereumChain` with a 0x-prefixed hex chain id
    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError>;
    /// `wallet_addEthereumChain`
    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderError>;
    /// `personal_sign`
    async fn sign_message(&self, _address: &str, _message: &[u8]) -> Result<String, ProviderError> {
        Err(ProviderError::other("message signing not supported by this provider"))
    }
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Signer handle bound to one account of a provider
#[derive(Clone)]
pub struct Signer {
    address: String,
    provider: Arc<dyn WalletProvider>,
}

impl Signer {
    pub fn new(address: impl Into<String>, provider: Arc<dyn WalletProvider>) -> Self {
        Self { address: address.into(), provider }
    }

    pub fn address(&self) -> &str { &self.address }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> { &self.provider }

    pub async fn sign_message(&self, message: &[u8]) -> Result<String, ProviderError> {
        self.provider.sign_message(&self.address, message).await
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").field("address", &self.address).finish_non_exhaustive()
    }
}
