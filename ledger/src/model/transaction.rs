//! Transaction records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// What kind of token movement a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Wallet-to-wallet transfer.
    Transfer,
    /// Tokens minted into a wallet.
    Mint,
    /// Tokens paid out for a claimed reward.
    Reward,
}

impl TransactionType {
    /// Every accepted value, in wire form.
    pub const ALL: [&'static str; 3] = ["transfer", "mint", "reward"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Mint => "mint",
            Self::Reward => "reward",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer" => Ok(Self::Transfer),
            "mint" => Ok(Self::Mint),
            "reward" => Ok(Self::Reward),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a recorded transaction.
///
/// The store does not restrict transitions: any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded, not yet confirmed.
    #[default]
    Pending,
    /// Confirmed on chain. Stamps `confirmed_at`.
    Confirmed,
    /// Rejected or dropped.
    Failed,
}

impl TransactionStatus {
    /// Every accepted value, in wire form.
    pub const ALL: [&'static str; 3] = ["pending", "confirmed", "failed"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "failed" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A recorded token movement.
///
/// `confirmed_at` is set the first time (and every time) the status is
/// updated to [`TransactionStatus::Confirmed`]. Moving the status elsewhere
/// afterwards leaves it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub tx_hash: String,
    /// 45-digit code derived from `tx_hash`.
    pub transaction_code: String,
    pub from_address: String,
    pub to_address: String,
    /// Decimal string, at most 6 fractional digits.
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub block_height: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Returns `true` if `address` is the sender or the recipient.
    pub fn involves(&self, address: &str) -> bool {
        self.from_address == address || self.to_address == address
    }
}

/// Fields supplied by the caller when recording a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub tx_hash: String,
    pub transaction_code: String,
    pub from_address: String,
    pub to_address: String,
    pub amount: String,
    pub kind: TransactionType,
    /// Defaults to `Pending` when absent.
    pub status: Option<TransactionStatus>,
    pub block_height: Option<u64>,
}

/// A status change requested for an existing transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: TransactionStatus,
    /// Replaces the stored block height when present; otherwise it is kept.
    pub block_height: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for s in TransactionStatus::ALL {
            let status: TransactionStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!("Confirmed".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_type_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionType::Mint).unwrap();
        assert_eq!(json, "\"mint\"");
    }

    #[test]
    fn test_transaction_wire_format_is_camel_case() {
        let tx = Transaction {
            id: Uuid::nil(),
            tx_hash: "0x01".into(),
            transaction_code: "1".repeat(45),
            from_address: "0xa".into(),
            to_address: "0xb".into(),
            amount: "1.5".into(),
            kind: TransactionType::Transfer,
            status: TransactionStatus::default(),
            block_height: None,
            created_at: Utc::now(),
            confirmed_at: None,
        };
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["txHash"], "0x01");
        assert_eq!(value["type"], "transfer");
        assert_eq!(value["status"], "pending");
        assert!(value["confirmedAt"].is_null());
        assert!(tx.involves("0xb"));
        assert!(!tx.involves("0xc"));
    }
}
