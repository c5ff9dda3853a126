//! History aggregation: lifetime and today totals per direction

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use rust_decimal::Decimal;
use tracing::warn;

use crate::contract::{HistoryKind, RedpackHistoryItem};
use crate::core::amount::parse_amount;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryTotals {
    pub total_received: Decimal,
    pub total_sent: Decimal,
    pub received_count: u64,
    pub sent_count: u64,
    pub today_received: Decimal,
    pub today_sent: Decimal,
}

/// Unix seconds of local midnight starting the day of `now`
pub fn local_midnight(now: DateTime<Local>) -> i64 {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.timestamp(),
        // Midnight skipped by a DST jump: use today's offset
        None => midnight.and_utc().timestamp() - i64::from(now.offset().local_minus_utc()),
    }
}

/// Sum history items. Items at or after `today_start` (unix seconds) also
/// count toward today's totals. Malformed amounts are skipped.
pub fn aggregate_history(items: &[RedpackHistoryItem], today_start: i64) -> HistoryTotals {
    let mut totals = HistoryTotals::default();
    for item in items {
        let Some(amount) = parse_amount(&item.amount) else {
            warn!(amount = %item.amount, "skipping history item with malformed amount");
            continue;
        };
        let today = item.timestamp >= today_start;
        match item.kind {
            HistoryKind::Received => {
                totals.total_received += amount;
                totals.received_count += 1;
                if today { totals.today_received += amount; }
            }
            HistoryKind::Sent => {
                totals.total_sent += amount;
                totals.sent_count += 1;
                if today { totals.today_sent += amount; }
            }
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use std::str::FromStr;

    fn item(amount: &str, kind: HistoryKind, timestamp: i64) -> RedpackHistoryItem {
        RedpackHistoryItem { amount: amount.into(), timestamp, kind }
    }

    fn dec(s: &str) -> Decimal { Decimal::from_str(s).unwrap() }

    #[test]
    fn partitions_lifetime_and_today() {
        let today = 1_700_000_000;
        let items = vec![
            item("1.5", HistoryKind::Received, today + 60),
            item("0.5", HistoryKind::Sent, today + 120),
            item("2", HistoryKind::Received, today - 86_400),
        ];
        let totals = aggregate_history(&items, today);
        assert_eq!(totals.total_received, dec("3.5"));
        assert_eq!(totals.total_sent, dec("0.5"));
        assert_eq!(totals.received_count, 2);
        assert_eq!(totals.sent_count, 1);
        assert_eq!(totals.today_received, dec("1.5"));
        assert_eq!(totals.today_sent, dec("0.5"));
        assert_eq!(totals.total_received.to_string(), "3.5");
    }

    #[test]
    fn boundary_is_inclusive_and_bad_amounts_skipped() {
        let start = 1_000;
        let items = vec![
            item("0.1", HistoryKind::Received, start),
            item("oops", HistoryKind::Received, start),
            item("0.2", HistoryKind::Sent, start - 1),
        ];
        let totals = aggregate_history(&items, start);
        assert_eq!(totals.received_count, 1);
        assert_eq!(totals.today_received, dec("0.1"));
        assert_eq!(totals.today_sent, Decimal::ZERO);
        assert_eq!(totals.total_sent, dec("0.2"));
    }

    #[test]
    fn fixed_point_sums_do_not_drift() {
        let items: Vec<_> = (0..10).map(|_| item("0.1", HistoryKind::Received, 0)).collect();
        assert_eq!(aggregate_history(&items, 0).total_received, dec("1.0"));
    }

    #[test]
    fn midnight_is_start_of_local_day() {
        let now = Local::now();
        let midnight = local_midnight(now);
        assert!(midnight <= now.timestamp());
        assert!(now.timestamp() - midnight < 86_400 + 3_600);
        let at = Local.timestamp_opt(midnight, 0).single().expect("local time");
        assert_eq!((at.hour(), at.minute()), (0, 0));
    }
}
