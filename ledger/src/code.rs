//! Transaction code derivation.
//!
//! A transaction code is a [`TRANSACTION_CODE_LENGTH`]-digit decimal string
//! that users can read out or paste instead of a 66-character hash. Digit
//! `i` is byte `i mod L` of the decoded hash, reduced modulo 10, so hashes
//! shorter than the code simply cycle.
//!
//! The mapping is lossy on purpose: it is a display reference, not an
//! identifier. Two different hashes can share a code.

use thiserror::Error;

use crate::config::{HEX_PREFIX, TRANSACTION_CODE_LENGTH};

/// Errors returned by [`generate_transaction_code`].
#[derive(Debug, Error, PartialEq)]
pub enum CodeError {
    /// Nothing left to decode once the `0x` prefix is removed.
    #[error("transaction hash is empty")]
    Empty,

    /// The payload is not valid hex (odd length or a non-hex character).
    #[error("transaction hash is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Derives the transaction code for `tx_hash`.
///
/// Accepts the hash with or without a leading `0x` (either case).
///
/// # Errors
///
/// [`CodeError::Empty`] when the hex payload has zero length,
/// [`CodeError::InvalidHex`] when it cannot be decoded.
///
/// # Example
///
/// ```
/// use xaro_ledger::generate_transaction_code;
///
/// let code = generate_transaction_code("0xAABB").unwrap();
/// assert!(code.starts_with("0707"));
/// assert_eq!(code.len(), 45);
/// ```
pub fn generate_transaction_code(tx_hash: &str) -> Result<String, CodeError> {
    let payload = strip_hex_prefix(tx_hash);
    if payload.is_empty() {
        return Err(CodeError::Empty);
    }

    let bytes = hex::decode(payload)?;

    let code = bytes
        .iter()
        .cycle()
        .take(TRANSACTION_CODE_LENGTH)
        .map(|b| char::from(b'0' + b % 10))
        .collect();

    Ok(code)
}

/// Returns `true` if `code` has the shape of a transaction code: exactly
/// [`TRANSACTION_CODE_LENGTH`] ASCII digits.
pub fn is_transaction_code(code: &str) -> bool {
    code.len() == TRANSACTION_CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix(HEX_PREFIX)
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
