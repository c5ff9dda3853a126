//! In-memory fakes of the wallet provider and the red packet contract

#![allow(dead_code)]

use async_trait::async_trait;
pub use redpack::core::sync::lock;
use redpack::error::ProviderError;
use redpack::wallet::network::parse_chain_id;
use redpack::wallet::AddChainParams;
use redpack::{ContractBinding, ContractError, ContractEvent, ProviderEvent, RankInfo, RedPack, RedpackHistoryItem, WalletProvider};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

pub const ADDR: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
pub const OTHER: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
pub const SEPOLIA: u64 = 11_155_111;
/// 1.5 ether
pub const ONE_AND_A_HALF_ETH: u128 = 1_500_000_000_000_000_000;

/// Poll `condition` every 5ms until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() { return true; }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub async fn settle<F: Future>(f: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), f).await.expect("future settled")
}

// =============================================================================
// Wallet provider
// =============================================================================

pub struct MockProvider {
    pub accounts: Mutex<Vec<String>>,
    pub authorized: Mutex<Vec<String>>,
    pub chain_id: Mutex<u64>,
    pub balance_wei: Mutex<u128>,
    pub request_error: Mutex<Option<ProviderError>>,
    pub add_error: Mutex<Option<ProviderError>>,
    pub balance_error: Mutex<Option<ProviderError>>,
    /// Chains `switch_chain` accepts; anything else is 4902
    pub known_chains: Mutex<Vec<u64>>,
    pub request_delay: Mutex<Duration>,
    pub request_calls: AtomicUsize,
    pub switch_calls: AtomicUsize,
    pub add_calls: AtomicUsize,
    pub balance_calls: AtomicUsize,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(vec![ADDR.to_string()]),
            authorized: Mutex::new(vec![ADDR.to_string()]),
            chain_id: Mutex::new(SEPOLIA),
            balance_wei: Mutex::new(ONE_AND_A_HALF_ETH),
            request_error: Mutex::new(None),
            add_error: Mutex::new(None),
            balance_error: Mutex::new(None),
            known_chains: Mutex::new(vec![1, SEPOLIA]),
            request_delay: Mutex::new(Duration::ZERO),
            request_calls: AtomicUsize::new(0),
            switch_calls: AtomicUsize::new(0),
            add_calls: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
            events,
        }
    }

    pub fn emit(&self, event: ProviderEvent) { let _ = self.events.send(event); }

    pub fn requests(&self) -> usize { self.request_calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.request_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = lock(&self.request_error).clone() {
            return Err(e);
        }
        Ok(lock(&self.accounts).clone())
    }

    async fn accounts(&self) -> Result<Vec<String>, ProviderError> { Ok(lock(&self.authorized).clone()) }

    async fn chain_id(&self) -> Result<u64, ProviderError> { Ok(*lock(&self.chain_id)) }

    async fn balance(&self, _address: &str) -> Result<u128, ProviderError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.balance_error).clone() {
            Some(e) => Err(e),
            None => Ok(*lock(&self.balance_wei)),
        }
    }

    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError> {
        self.switch_calls.fetch_add(1, Ordering::SeqCst);
        let chain_id = parse_chain_id(chain_id_hex).ok_or_else(|| ProviderError::other("bad chain id"))?;
        if !lock(&self.known_chains).contains(&chain_id) {
            return Err(ProviderError::new(4902, "Unrecognized chain ID"));
        }
        *lock(&self.chain_id) = chain_id;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = lock(&self.add_error).clone() {
            return Err(e);
        }
        let chain_id = parse_chain_id(&params.chain_id).ok_or_else(|| ProviderError::other("bad chain id"))?;
        lock(&self.known_chains).push(chain_id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> { self.events.subscribe() }
}

// =============================================================================
// Contract binding
// =============================================================================

pub struct MockContract {
    pub balance: Mutex<Result<Decimal, ContractError>>,
    pub history: Mutex<Result<Vec<RedpackHistoryItem>, ContractError>>,
    pub active: Mutex<Result<Vec<RedPack>, ContractError>>,
    pub rank: Mutex<Result<RankInfo, ContractError>>,
    pub attempts: Mutex<Option<u64>>,
    /// Delay applied to the next history calls, in order
    pub history_delays: Mutex<VecDeque<Duration>>,
    pub history_calls: AtomicUsize,
    events: broadcast::Sender<ContractEvent>,
}

impl MockContract {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            balance: Mutex::new(Ok(Decimal::new(25, 2))),
            history: Mutex::new(Ok(Vec::new())),
            active: Mutex::new(Ok(Vec::new())),
            rank: Mutex::new(Ok(RankInfo { rank: 3, total_users: 120 })),
            attempts: Mutex::new(None),
            history_delays: Mutex::new(VecDeque::new()),
            history_calls: AtomicUsize::new(0),
            events,
        }
    }

    pub fn emit(&self, event: ContractEvent) { let _ = self.events.send(event); }

    pub fn fetches(&self) -> usize { self.history_calls.load(Ordering::SeqCst) }
}

#[async_trait]
impl ContractBinding for MockContract {
    async fn get_user_balance(&self, _address: &str) -> Result<Decimal, ContractError> { lock(&self.balance).clone() }

    async fn get_redpack_history(&self, _address: &str) -> Result<Vec<RedpackHistoryItem>, ContractError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let result = lock(&self.history).clone();
        let delay = lock(&self.history_delays).pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn get_active_redpacks(&self, _address: &str) -> Result<Vec<RedPack>, ContractError> { lock(&self.active).clone() }

    async fn get_user_rank(&self, _address: &str) -> Result<RankInfo, ContractError> { lock(&self.rank).clone() }

    async fn get_claim_attempts(&self, _address: &str) -> Result<u64, ContractError> {
        lock(&self.attempts).ok_or(ContractError::Unsupported("getClaimAttempts"))
    }

    fn subscribe(&self) -> broadcast::Receiver<ContractEvent> { self.events.subscribe() }
}
