//! UserStatsAggregator - one stats snapshot for the connected wallet
//!
//! `refresh_stats()` serves a valid cache entry when there is one, otherwise
//! joins the lookups concurrently and stores the merged snapshot in memory and
//! in the cache. Every live fetch and every cache hit takes a token; only the
//! newest token may apply its result, so a slow response never overwrites a
//! fresher one. A response for an address that is no longer connected is
//! dropped as well.

use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::aggregate::{aggregate_history, local_midnight, HistoryTotals};
use super::cache::{now_ms, StatsCache};
use super::model::UserStats;
use crate::config::StatsConfig;
use crate::contract::{ContractBinding, ContractEvent, RankInfo};
use crate::core::amount::wei_to_ether;
use crate::core::sync::lock;
use crate::error::{ContractError, StatsError, StatsResult};
use crate::wallet::{address, WalletSession};

#[derive(Debug, Default)]
struct StatsState {
    error: Option<StatsError>,
    last_fetched: Option<i64>,
    fetched_for: Option<String>,
}

struct Inner {
    session: WalletSession,
    contract: Option<Arc<dyn ContractBinding>>,
    cache: StatsCache,
    config: StatsConfig,
    stats: watch::Sender<UserStats>,
    state: Mutex<StatsState>,
    token: AtomicU64,
    in_flight: AtomicUsize,
}

#[derive(Clone)]
pub struct UserStatsAggregator {
    inner: Arc<Inner>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) { self.0.fetch_sub(1, Ordering::SeqCst); }
}

impl UserStatsAggregator {
    /// `contract` is `None` when no binding is deployed; contract-backed
    /// fields then stay at their defaults.
    pub fn new(session: WalletSession, contract: Option<Arc<dyn ContractBinding>>, config: StatsConfig) -> Self {
        let cache = StatsCache::new(session.storage().clone(), config.cache_duration);
        let (stats, _) = watch::channel(UserStats::default());
        Self {
            inner: Arc::new(Inner {
                session,
                contract,
                cache,
                config,
                stats,
                state: Mutex::new(StatsState::default()),
                token: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn stats(&self) -> UserStats { self.inner.stats.borrow().clone() }
    pub fn watch_stats(&self) -> watch::Receiver<UserStats> { self.inner.stats.subscribe() }
    pub fn error(&self) -> Option<StatsError> { lock(&self.inner.state).error.clone() }
    pub fn is_loading(&self) -> bool { self.inner.in_flight.load(Ordering::SeqCst) > 0 }
    pub fn last_fetched(&self) -> Option<i64> { lock(&self.inner.state).last_fetched }
    pub fn config(&self) -> &StatsConfig { &self.inner.config }
    pub fn cache(&self) -> &StatsCache { &self.inner.cache }
    pub fn session(&self) -> &WalletSession { &self.inner.session }

    pub fn net_amount(&self) -> Decimal { self.inner.stats.borrow().net_amount() }
    pub fn avg_received(&self) -> Decimal { self.inner.stats.borrow().avg_received() }
    pub fn avg_sent(&self) -> Decimal { self.inner.stats.borrow().avg_sent() }
    pub fn success_rate(&self) -> Option<Decimal> { self.inner.stats.borrow().success_rate() }

    /// Contract notifications, when a binding is present
    pub fn contract_events(&self) -> Option<broadcast::Receiver<ContractEvent>> {
        self.inner.contract.as_ref().map(|c| c.subscribe())
    }

    /// The in-memory snapshot was fetched (or restored) for the current
    /// address within the cache duration
    pub fn is_cache_valid(&self) -> bool {
        let Some(current) = self.inner.session.address() else { return false };
        let state = lock(&self.inner.state);
        match (&state.fetched_for, state.last_fetched) {
            (Some(fetched_for), Some(at)) => {
                address::same(fetched_for, &current)
                    && i128::from(now_ms() - at) < self.inner.config.cache_duration.as_millis() as i128
            }
            _ => false,
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Cache first, live fetch otherwise. Disconnected: reset to defaults.
    pub async fn refresh_stats(&self) -> StatsResult<()> {
        let Some(address) = self.inner.session.address() else {
            self.reset();
            return Ok(());
        };
        if self.apply_cached(&address) {
            return Ok(());
        }
        self.fetch(&address).await
    }

    /// Live fetch, ignoring the cache (after contract events)
    pub async fn refetch(&self) -> StatsResult<()> {
        let Some(address) = self.inner.session.address() else {
            self.reset();
            return Ok(());
        };
        self.fetch(&address).await
    }

    /// Back to default stats; in-flight fetches become stale
    pub fn reset(&self) {
        self.inner.token.fetch_add(1, Ordering::SeqCst);
        *lock(&self.inner.state) = StatsState::default();
        self.inner.stats.send_replace(UserStats::default());
    }

    /// Apply a valid cache entry for `address`. `false` on miss. A hit
    /// supersedes any fetch still in flight.
    pub fn apply_cached(&self, address: &str) -> bool {
        let Some(entry) = self.inner.cache.load(address, now_ms()) else { return false };
        debug!(address, age_ms = entry.age_ms(now_ms()), "stats served from cache");
        self.inner.token.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = lock(&self.inner.state);
            state.last_fetched = Some(entry.timestamp);
            state.fetched_for = Some(address.to_string());
            state.error = None;
        }
        self.inner.stats.send_replace(entry.stats);
        true
    }

    async fn fetch(&self, address: &str) -> StatsResult<()> {
        let token = self.inner.token.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight::enter(&self.inner.in_flight);

        let result = self.collect(address).await;
        if self.inner.token.load(Ordering::SeqCst) != token {
            debug!(address, token, "discarding superseded stats response");
            return Ok(());
        }
        let connected = self.inner.session.address();
        if !connected.as_deref().is_some_and(|current| address::same(current, address)) {
            debug!(address, "discarding stats for a wallet no longer connected");
            return Ok(());
        }
        match result {
            Ok(stats) => {
                let now = now_ms();
                self.inner.cache.save(address, &stats, now);
                {
                    let mut state = lock(&self.inner.state);
                    state.last_fetched = Some(now);
                    state.fetched_for = Some(address.to_string());
                    state.error = None;
                }
                self.inner.stats.send_replace(stats);
                info!(address, "user stats refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(address, error = %e, "user stats refresh failed");
                lock(&self.inner.state).error = Some(e.clone());
                Err(e)
            }
        }
    }

    async fn collect(&self, address: &str) -> StatsResult<UserStats> {
        let (wallet_balance, contract_balance, history, active, rank, attempts) = tokio::join!(
            self.wallet_balance(address),
            self.contract_balance(address),
            self.history_totals(address),
            self.active_redpacks(address),
            self.user_rank(address),
            self.claim_attempts(address),
        );
        let history = history?;
        Ok(UserStats {
            wallet_balance: wallet_balance?,
            contract_balance,
            total_received: history.total_received,
            total_sent: history.total_sent,
            received_count: history.received_count,
            sent_count: history.sent_count,
            active_redpacks: active?,
            today_received: history.today_received,
            today_sent: history.today_sent,
            user_rank: rank.map(|r| r.rank),
            total_users: rank.map(|r| r.total_users),
            claim_attempts: attempts,
        })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    async fn wallet_balance(&self, address: &str) -> StatsResult<Decimal> {
        let Some(provider) = self.inner.session.state().provider().cloned() else {
            return Ok(Decimal::ZERO);
        };
        let wei = provider
            .balance(address)
            .await
            .map_err(|e| StatsError::AggregationFailed(format!("wallet balance: {}", e)))?;
        wei_to_ether(wei)
            .ok_or_else(|| StatsError::AggregationFailed(format!("wallet balance out of range: {} wei", wei)))
    }

    /// Optional: any failure reads as zero
    async fn contract_balance(&self, address: &str) -> Decimal {
        let Some(contract) = &self.inner.contract else { return Decimal::ZERO };
        match contract.get_user_balance(address).await {
            Ok(balance) => balance,
            Err(e) => {
                debug!(error = %e, "contract balance unavailable");
                Decimal::ZERO
            }
        }
    }

    async fn history_totals(&self, address: &str) -> StatsResult<HistoryTotals> {
        let Some(contract) = &self.inner.contract else { return Ok(HistoryTotals::default()) };
        match contract.get_redpack_history(address).await {
            Ok(items) => Ok(aggregate_history(&items, local_midnight(chrono::Local::now()))),
            Err(ContractError::Unsupported(method)) => {
                debug!(method, "history lookup not supported");
                Ok(HistoryTotals::default())
            }
            Err(e) => Err(StatsError::AggregationFailed(format!("red packet history: {}", e))),
        }
    }

    async fn active_redpacks(&self, address: &str) -> StatsResult<u64> {
        let Some(contract) = &self.inner.contract else { return Ok(0) };
        match contract.get_active_redpacks(address).await {
            Ok(packs) => Ok(packs.len() as u64),
            Err(ContractError::Unsupported(method)) => {
                debug!(method, "active red packet lookup not supported");
                Ok(0)
            }
            Err(e) => Err(StatsError::AggregationFailed(format!("active red packets: {}", e))),
        }
    }

    /// Optional: any failure means no rank
    async fn user_rank(&self, address: &str) -> Option<RankInfo> {
        let contract = self.inner.contract.as_ref()?;
        contract
            .get_user_rank(address)
            .await
            .map_err(|e| debug!(error = %e, "user rank unavailable"))
            .ok()
    }

    async fn claim_attempts(&self, address: &str) -> Option<u64> {
        let contract = self.inner.contract.as_ref()?;
        contract
            .get_claim_attempts(address)
            .await
            .map_err(|e| debug!(error = %e, "claim attempts unavailable"))
            .ok()
    }
}
