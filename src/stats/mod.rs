//! User statistics for the connected wallet
//!
//! # Architecture
//!
//! ```text
//! WalletSession ──watch──┐
//!                        ▼
//!   ContractBinding ─► UserStatsAggregator ─► watch<UserStats>
//!        │                  │
//!        │ events           └─► StatsCache (userStats_<address>)
//!        ▼
//!   StatsRefresher (mount / account change / interval / events)
//! ```
//!
//! Lookups run concurrently. Wallet balance and a failing history or active
//! red packet lookup fail the refresh; contract balance, rank and claim
//! attempts degrade to their defaults.

mod aggregate;
mod aggregator;
mod cache;
mod model;
mod refresher;

pub use aggregate::{aggregate_history, local_midnight, HistoryTotals};
pub use aggregator::UserStatsAggregator;
pub use cache::{now_ms, StatsCache, StatsCacheEntry};
pub use model::UserStats;
pub use refresher::StatsRefresher;
