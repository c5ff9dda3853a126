//! Static network registry, keyed by chain id

use super::provider::{AddChainParams, NativeCurrency};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub currency: &'static str,
    pub decimals: u8,
    pub explorer: Option<&'static str>,
}

pub const MAINNET: NetworkConfig = NetworkConfig {
    chain_id: 1,
    name: "Ethereum Mainnet",
    rpc_url: "https://cloudflare-eth.com",
    currency: "ETH",
    decimals: 18,
    explorer: Some("https://etherscan.io"),
};

pub const SEPOLIA: NetworkConfig = NetworkConfig {
    chain_id: 11_155_111,
    name: "Sepolia Testnet",
    rpc_url: "https://rpc.sepolia.org",
    currency: "ETH",
    decimals: 18,
    explorer: Some("https://sepolia.etherscan.io"),
};

pub const LOCALHOST: NetworkConfig = NetworkConfig {
    chain_id: 31_337,
    name: "Localhost 8545",
    rpc_url: "http://127.0.0.1:8545",
    currency: "ETH",
    decimals: 18,
    explorer: None,
};

pub const SUPPORTED_NETWORKS: &[NetworkConfig] = &[MAINNET, SEPOLIA, LOCALHOST];

pub fn lookup(chain_id: u64) -> Option<&'static NetworkConfig> {
    SUPPORTED_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// `11155111` -> `"0xaa36a7"`
pub fn chain_id_hex(chain_id: u64) -> String { format!("0x{:x}", chain_id) }

/// Accepts `0x`-prefixed hex or plain decimal
pub fn parse_chain_id(value: &str) -> Option<u64> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

impl NetworkConfig {
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: chain_id_hex(self.chain_id),
            chain_name: self.name.to_string(),
            rpc_urls: vec![self.rpc_url.to_string()],
            native_currency: NativeCurrency {
                name: self.currency.to_string(),
                symbol: self.currency.to_string(),
                decimals: self.decimals,
            },
            block_explorer_urls: self.explorer.map(|e| vec![e.to_string()]).unwrap_or_default(),
        }
    }
}
