//! UserStats snapshot and its derived values

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate statistics for one wallet. Amounts are ether.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub wallet_balance: Decimal,
    /// Ether escrowed for the user inside the contract
    pub contract_balance: Decimal,

    pub total_received: Decimal,
    pub total_sent: Decimal,
    pub received_count: u64,
    pub sent_count: u64,

    pub active_redpacks: u64,
    pub today_received: Decimal,
    pub today_sent: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rank: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_users: Option<u64>,
    /// Claim attempts reported by the contract, when it tracks them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_attempts: Option<u64>,
}

fn average(total: Decimal, count: u64) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    total.checked_div(Decimal::from(count)).map(|d| d.normalize()).unwrap_or(Decimal::ZERO)
}

impl UserStats {
    /// received - sent
    pub fn net_amount(&self) -> Decimal { (self.total_received - self.total_sent).normalize() }

    pub fn avg_received(&self) -> Decimal { average(self.total_received, self.received_count) }

    pub fn avg_sent(&self) -> Decimal { average(self.total_sent, self.sent_count) }

    /// Percentage of claim attempts that received something. `None` unless
    /// the contract reports a non-zero attempts counter.
    pub fn success_rate(&self) -> Option<Decimal> {
        let attempts = self.claim_attempts.filter(|a| *a > 0)?;
        let rate = Decimal::from(self.received_count) * Decimal::ONE_HUNDRED / Decimal::from(attempts);
        Some(rate.round_dp(2).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal { Decimal::from_str(s).unwrap() }

    #[test]
    fn derived_values() {
        let stats = UserStats {
            total_received: dec("3.5"),
            total_sent: dec("0.5"),
            received_count: 2,
            sent_count: 1,
            ..Default::default()
        };
        assert_eq!(stats.net_amount(), dec("3"));
        assert_eq!(stats.avg_received(), dec("1.75"));
        assert_eq!(stats.avg_sent(), dec("0.5"));
        assert_eq!(stats.success_rate(), None);

        let empty = UserStats::default();
        assert_eq!(empty.avg_received(), Decimal::ZERO);
        assert_eq!(empty.avg_sent(), Decimal::ZERO);
        assert_eq!(empty.net_amount(), Decimal::ZERO);
    }

    #[test]
    fn net_amount_can_go_negative() {
        let stats = UserStats { total_received: dec("0.1"), total_sent: dec("0.3"), ..Default::default() };
        assert_eq!(stats.net_amount(), dec("-0.2"));
    }

    #[test]
    fn success_rate_needs_attempt_counter() {
        let mut stats = UserStats { received_count: 3, claim_attempts: Some(4), ..Default::default() };
        assert_eq!(stats.success_rate(), Some(dec("75")));
        stats.claim_attempts = Some(0);
        assert_eq!(stats.success_rate(), None);
        stats.claim_attempts = Some(3);
        stats.received_count = 1;
        assert_eq!(stats.success_rate(), Some(dec("33.33")));
    }

    #[test]
    fn serializes_camel_case_decimal_strings() {
        let stats = UserStats { total_received: dec("1.5"), user_rank: Some(4), ..Default::default() };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalReceived"], "1.5");
        assert_eq!(json["userRank"], 4);
        assert!(json.get("totalUsers").is_none());
    }
}
