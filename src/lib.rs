//! Redpack: client core for the red packet dApp. Wallet session + user stats.
//!
//! # Architecture
//!
//! ```text
//! WalletSession (entry point)
//!   │
//!   ├── WalletProvider (injected wallet: accounts, chain, balance, events)
//!   ├── DurableStorage ("last connected" intent)
//!   └── watch<WalletState>
//!           │
//!           ▼
//! UserStatsAggregator
//!   │
//!   ├── ContractBinding (balance, history, active packs, rank)
//!   ├── StatsCache (userStats_<address>, 5 minutes)
//!   └── StatsRefresher (mount, account change, 2-minute tick, events)
//! ```
//!
//! # Features
//!
//! - `native` - File-backed storage, log subscriber, CLI
//!
//! # Usage
//!
//! ```ignore
//! use redpack::{MemoryStorage, SessionConfig, Shutdown, StatsConfig, StatsRefresher, UserStatsAggregator, WalletSession};
//! use std::sync::Arc;
//!
//! let session = WalletSession::new(Some(provider), Arc::new(MemoryStorage::new()), SessionConfig::default());
//! session.auto_connect().await?;
//!
//! let stats = UserStatsAggregator::new(session.clone(), Some(contract), StatsConfig::default());
//! let shutdown = Shutdown::new();
//! let _refresher = StatsRefresher::spawn(stats.clone(), shutdown.subscribe());
//!
//! let mut updates = stats.watch_stats();
//! updates.changed().await?;
//! println!("{}", redpack::format::format_eth_decimal(updates.borrow().total_received));
//! ```

// =============================================================================
// Shared modules
// =============================================================================
pub mod config;
pub mod contract;
pub mod core;
pub mod error;
pub mod format;
pub mod runtime;
pub mod stats;
pub mod storage;
pub mod wallet;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// Re-exports
// =============================================================================
pub use config::{SessionConfig, StatsConfig};
pub use contract::{ContractBinding, ContractEvent, HistoryKind, RankInfo, RedPack, RedpackHistoryItem, SplitKind};
pub use error::{ContractError, ProviderError, SessionError, StatsError, StorageError};
pub use runtime::Shutdown;
pub use stats::{StatsCache, StatsRefresher, UserStats, UserStatsAggregator};
pub use storage::{DurableStorage, MemoryStorage};
pub use wallet::{ConnectOutcome, ConnectionStatus, ProviderEvent, ProviderSubscription, WalletProvider, WalletSession, WalletState};

#[cfg(feature = "native")]
pub use storage::FileStorage;
