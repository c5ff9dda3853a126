//! Fixed-point ether amounts
//!
//! Chain amounts are wei-scale integers; everything above the provider speaks
//! `Decimal` ether so totals never drift the way binary floats do.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// 1 ether = 10^18 wei
pub const WEI_DECIMALS: u32 = 18;

/// Convert a wei amount to ether. `None` if it does not fit a 96-bit mantissa.
pub fn wei_to_ether(wei: u128) -> Option<Decimal> {
    let wei = i128::try_from(wei).ok()?;
    Decimal::try_from_i128_with_scale(wei, WEI_DECIMALS).ok().map(|d| d.normalize())
}

/// Parse a decimal string, tolerating surrounding whitespace
pub fn parse_amount(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok()
}

/// Round half away from zero and pad to exactly `dp` fraction digits
pub fn to_fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded.to_string()
}

/// Canonical decimal string: no trailing zeros ("3.50" -> "3.5", "2.0" -> "2")
pub fn to_plain(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wei_converts_to_ether() {
        assert_eq!(wei_to_ether(1_500_000_000_000_000_000).unwrap().to_string(), "1.5");
        assert_eq!(wei_to_ether(0).unwrap(), Decimal::ZERO);
        assert_eq!(wei_to_ether(1).unwrap().to_string(), "0.000000000000000001");
        assert!(wei_to_ether(u128::MAX).is_none());
    }

    #[test]
    fn fixed_and_plain_rendering() {
        let d = parse_amount("1.23456").unwrap();
        assert_eq!(to_fixed(d, 4), "1.2346");
        assert_eq!(to_fixed(parse_amount("0.5").unwrap(), 4), "0.5000");
        assert_eq!(to_fixed(Decimal::ZERO, 4), "0.0000");
        assert_eq!(to_plain(parse_amount("3.50").unwrap()), "3.5");
        assert!(parse_amount("abc").is_none());
    }
}
