//! Wallet address helpers.
//!
//! Addresses are opaque to the store. These helpers exist for log output and
//! for the advisory format check the client also performs; nothing here
//! rejects a record.

use crate::config::{ADDRESS_MIN_LENGTH, ADDRESS_PREFIX};

/// Returns `true` if `address` follows the wallet address convention:
/// the `0x` prefix and at least [`ADDRESS_MIN_LENGTH`] characters.
pub fn is_valid_address(address: &str) -> bool {
    address.starts_with(ADDRESS_PREFIX) && address.len() >= ADDRESS_MIN_LENGTH
}

/// Shortens an address to `0x1234...abcd` for display.
///
/// Addresses too short to abbreviate are returned unchanged. Operates on
/// chars, so a non-ASCII address never panics on a byte boundary.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_address() -> String {
        format!("0x{}", "ab".repeat(32))
    }

    #[test]
    fn test_full_length_address_is_valid() {
        assert!(is_valid_address(&full_address()));
    }

    #[test]
    fn test_short_or_unprefixed_address_is_invalid() {
        assert!(!is_valid_address("0x1234"));
        assert!(!is_valid_address(&"ab".repeat(40)));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn test_shorten_keeps_head_and_tail() {
        let addr = full_address();
        assert_eq!(shorten_address(&addr), "0xabab...abab");
    }

    #[test]
    fn test_shorten_leaves_short_input_alone() {
        assert_eq!(shorten_address("0x12"), "0x12");
        assert_eq!(shorten_address(""), "");
    }
}
