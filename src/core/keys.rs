//! Storage key and timing constants
//!
//! Centralized registry for every durable-storage key the crate touches.

/// Session intent keys ("last connected")
pub mod session {
    pub const CONNECTED: &str = "walletConnected";
    pub const ADDRESS: &str = "walletAddress";

    pub const CONNECTED_TRUE: &str = "true";

    pub const ALL: &[&str] = &[CONNECTED, ADDRESS];
}

/// Stats cache keys
pub mod stats {
    pub const CACHE_PREFIX: &str = "userStats";

    /// Cache key for one wallet address: `userStats_<address>`
    pub fn cache_key(address: &str) -> String {
        format!("{}_{}", CACHE_PREFIX, address)
    }

    pub fn is_cache_key(key: &str) -> bool {
        key.strip_prefix(CACHE_PREFIX).map(|rest| rest.starts_with('_')).unwrap_or(false)
    }
}

/// Timing defaults
pub mod timing {
    use std::time::Duration;

    pub const CACHE_DURATION: Duration = Duration::from_secs(5 * 60);
    pub const REFRESH_INTERVAL: Duration = Duration::from_secs(2 * 60);
    pub const EVENT_REFRESH_DELAY: Duration = Duration::from_secs(1);
}

/// Sepolia testnet
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// Fraction digits kept on the session balance string
pub const BALANCE_DECIMALS: u32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_namespaced_per_address() {
        assert_eq!(stats::cache_key("0xabc"), "userStats_0xabc");
        assert!(stats::is_cache_key("userStats_0xabc"));
        assert!(!stats::is_cache_key("userStatsX"));
        assert!(!stats::is_cache_key(session::ADDRESS));
    }
}
