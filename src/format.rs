//! Display formatting for amounts, counts and addresses

use rust_decimal::Decimal;

use crate::core::amount::{parse_amount, to_fixed};

/// Smallest magnitude rendered as a number
const NEGLIGIBLE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);
const NEGLIGIBLE_MARKER: &str = "<0.0001";

/// Render an ether amount with magnitude-dependent precision:
/// 4 fraction digits below 1, 3 below 10, 2 otherwise.
/// Zero and unparseable input render as "0".
pub fn format_eth(value: &str) -> String {
    match parse_amount(value) {
        Some(amount) => format_eth_decimal(amount),
        None => "0".to_string(),
    }
}

pub fn format_eth_decimal(amount: Decimal) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }
    let magnitude = amount.abs();
    if magnitude < NEGLIGIBLE {
        return NEGLIGIBLE_MARKER.to_string();
    }
    let dp = if magnitude < Decimal::ONE {
        4
    } else if magnitude < Decimal::TEN {
        3
    } else {
        2
    };
    to_fixed(amount, dp)
}

/// Abbreviate counts: "999", "2.5k", "25k", "1.5M"
pub fn format_count(value: u64) -> String {
    match value {
        0..=999 => value.to_string(),
        1_000..=9_999 => tenths(div_round(value, 100), "k"),
        10_000..=999_999 => format!("{}k", div_round(value, 1_000)),
        _ => tenths(div_round(value, 100_000), "M"),
    }
}

/// Half-up division that cannot overflow near `u64::MAX`
fn div_round(value: u64, divisor: u64) -> u64 {
    value / divisor + u64::from(value % divisor >= divisor / 2)
}

fn tenths(scaled: u64, suffix: &str) -> String {
    format!("{}.{}{}", scaled / 10, scaled % 10, suffix)
}

/// "0x1234...abcd". Anything too short to shorten is returned as is.
pub fn short_address(address: &str) -> String {
    match (address.get(..6), address.get(address.len().saturating_sub(4)..)) {
        (Some(head), Some(tail)) if address.len() > 10 => format!("{}...{}", head, tail),
        _ => address.to_string(),
    }
}
