//! Wallet module - session over an injected wallet provider
//!
//! # Architecture
//!
//! ```text
//! WalletSession
//!     │
//!     ├── WalletState (watch channel) ── address / balance / chain / signer
//!     │
//!     ├── ConnectionStatus: Idle → Connecting → Connected | Error
//!     │
//!     ├── DurableStorage: walletConnected / walletAddress
//!     │
//!     └── WalletProvider (trait)
//!             │
//!             ├── request_accounts / accounts / chain_id / balance
//!             ├── switch_chain / add_chain ◄── network::SUPPORTED_NETWORKS
//!             └── subscribe() ──► ProviderSubscription task
//!                                   ├── accounts [] → disconnect
//!                                   ├── accounts [other] → reconnect
//!                                   └── chain → chain id + balance
//! ```
//!
//! # Operations
//!
//! | Operation | Errors |
//! |-----------|--------|
//! | `connect()` | ProviderMissing, UserRejected (4001), RequestPending (-32002), Provider |
//! | `auto_connect()` | ProviderMissing |
//! | `disconnect()` | - |
//! | `switch_network(id)` | NotConnected, UnsupportedNetwork, AddNetworkFailed, SwitchFailed |

pub mod address;
pub mod network;
mod provider;
mod session;
mod state;

pub use network::{NetworkConfig, SUPPORTED_NETWORKS};
pub use provider::{AddChainParams, NativeCurrency, ProviderEvent, Signer, WalletProvider};
pub use session::{ConnectOutcome, ProviderSubscription, WalletSession};
pub use state::{ConnectionStatus, WalletSnapshot, WalletState};
