//! Session and stats configuration - passed from the host

use std::time::Duration;

use crate::core::keys::{self, timing};

/// Wallet session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Chain the dApp expects (`is_correct_network`)
    pub expected_chain_id: u64,
    /// Fraction digits kept on the session balance string
    pub balance_decimals: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { expected_chain_id: keys::DEFAULT_CHAIN_ID, balance_decimals: keys::BALANCE_DECIMALS }
    }
}

impl SessionConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_expected_chain(mut self, chain_id: u64) -> Self { self.expected_chain_id = chain_id; self }
    pub fn with_balance_decimals(mut self, dp: u32) -> Self { self.balance_decimals = dp; self }
}

/// Stats aggregation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsConfig {
    /// Cache entries older than this are purged
    pub cache_duration: Duration,
    /// Periodic refresh tick (fetches only when the cache is stale)
    pub refresh_interval: Duration,
    /// Delay between a contract event and the refetch (chain confirmation)
    pub event_refresh_delay: Duration,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            cache_duration: timing::CACHE_DURATION,
            refresh_interval: timing::REFRESH_INTERVAL,
            event_refresh_delay: timing::EVENT_REFRESH_DELAY,
        }
    }
}

impl StatsConfig {
    pub fn new() -> Self { Self::default() }

    /// Millisecond timings for tests
    pub fn fast_test() -> Self {
        Self {
            cache_duration: Duration::from_millis(200),
            refresh_interval: Duration::from_millis(50),
            event_refresh_delay: Duration::from_millis(10),
        }
    }

    pub fn with_cache_duration(mut self, d: Duration) -> Self { self.cache_duration = d; self }
    pub fn with_refresh_interval(mut self, d: Duration) -> Self { self.refresh_interval = d; self }
    pub fn with_event_refresh_delay(mut self, d: Duration) -> Self { self.event_refresh_delay = d; self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dapp_timings() {
        let stats = StatsConfig::default();
        assert_eq!(stats.cache_duration, Duration::from_secs(300));
        assert_eq!(stats.refresh_interval, Duration::from_secs(120));
        assert_eq!(stats.event_refresh_delay, Duration::from_secs(1));

        let session = SessionConfig::new().with_expected_chain(1);
        assert_eq!(session.expected_chain_id, 1);
        assert_eq!(session.balance_decimals, 4);
    }
}
