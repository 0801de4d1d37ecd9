//! # Ledger Constants
//!
//! Every fixed number the backend relies on. The transaction code length and
//! the amount precision are part of the wire contract with the client; change
//! them and every stored code stops matching what the client displays.

// ---------------------------------------------------------------------------
// Transaction Codes
// ---------------------------------------------------------------------------

/// Number of decimal digits in a transaction code.
pub const TRANSACTION_CODE_LENGTH: usize = 45;

/// Prefix stripped from a transaction hash before hex decoding.
pub const HEX_PREFIX: &str = "0x";

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Maximum number of fractional digits in an amount string.
pub const AMOUNT_SCALE: u32 = 6;

/// Maximum number of significant digits in an amount string.
pub const AMOUNT_PRECISION: u32 = 18;

/// Token ticker, used only for log lines.
pub const TOKEN_SYMBOL: &str = "XARO";

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Wallet addresses are expected to start with this prefix.
pub const ADDRESS_PREFIX: &str = "0x";

/// Minimum length of a conforming wallet address, prefix included.
/// 32 bytes hex-encoded plus the prefix.
pub const ADDRESS_MIN_LENGTH: usize = 66;

// ---------------------------------------------------------------------------
// Server Defaults
// ---------------------------------------------------------------------------

/// Default port for the REST API.
pub const DEFAULT_API_PORT: u16 = 5000;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 9464;

/// Broadcast channel capacity for live wallet events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_min_length_covers_32_byte_key() {
        assert_eq!(ADDRESS_MIN_LENGTH, ADDRESS_PREFIX.len() + 64);
    }

    #[test]
    fn test_amount_scale_fits_precision() {
        assert!(AMOUNT_SCALE < AMOUNT_PRECISION);
    }

    #[test]
    fn test_ports_are_distinct() {
        assert_ne!(DEFAULT_API_PORT, DEFAULT_METRICS_PORT);
    }
}
