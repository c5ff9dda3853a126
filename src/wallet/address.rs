//! 0x-address helpers

use once_cell::sync::Lazy;
use regex::Regex;

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static address regex")
});

pub fn is_valid(address: &str) -> bool { ADDRESS_RE.is_match(address) }

/// Addresses compare case-insensitively (EIP-55 checksum casing is cosmetic)
pub fn same(a: &str, b: &str) -> bool { a.eq_ignore_ascii_case(b) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_and_compares() {
        let lower = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
        let checksummed = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert!(is_valid(lower));
        assert!(is_valid(checksummed));
        assert!(!is_valid("0x1234"));
        assert!(!is_valid("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(same(lower, checksummed));
        assert!(!same(lower, "0x0000000000000000000000000000000000000000"));
    }
}
