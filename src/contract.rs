//! ContractBinding - read access to the red packet contract
//!
//! The contract itself lives elsewhere; hosts implement this trait over their
//! RPC client. Any method may be unsupported by a given deployment: return
//! `ContractError::Unsupported` and callers treat the feature as absent.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::ContractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Received,
    Sent,
}

/// One entry of a user's red packet history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedpackHistoryItem {
    /// Ether amount as a decimal string
    pub amount: String,
    /// Unix seconds
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Random,
    Equal,
}

/// An active red packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedPack {
    pub id: u64,
    pub creator: String,
    pub total: Decimal,
    pub remaining: Decimal,
    pub count: u32,
    pub claimed: u32,
    #[serde(rename = "type")]
    pub kind: SplitKind,
}

impl RedPack {
    pub fn is_exhausted(&self) -> bool { self.claimed >= self.count || self.remaining.is_zero() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankInfo {
    pub rank: u64,
    pub total_users: u64,
}

/// Contract notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    RedpackCreated { id: u64, creator: String },
    RedpackClaimed { id: u64, claimer: String },
}

impl ContractEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ContractEvent::RedpackCreated { .. } => "RedpackCreated",
            ContractEvent::RedpackClaimed { .. } => "RedpackClaimed",
        }
    }
}

#[async_trait]
pub trait ContractBinding: Send + Sync {
    /// Ether held for `address` inside the contract
    async fn get_user_balance(&self, address: &str) -> Result<Decimal, ContractError>;
    async fn get_redpack_history(&self, address: &str) -> Result<Vec<RedpackHistoryItem>, ContractError>;
    async fn get_active_redpacks(&self, address: &str) -> Result<Vec<RedPack>, ContractError>;
    async fn get_user_rank(&self, address: &str) -> Result<RankInfo, ContractError>;
    /// Claim attempts (successful or not); backs `UserStats::success_rate`
    async fn get_claim_attempts(&self, _address: &str) -> Result<u64, ContractError> {
        Err(ContractError::Unsupported("getClaimAttempts"))
    }
    fn subscribe(&self) -> broadcast::Receiver<ContractEvent>;
}
