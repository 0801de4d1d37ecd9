//! Reward records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A claimable incentive credited to a wallet.
///
/// `claimed_at` is `Some` exactly when `claimed` is `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: Uuid,
    /// Owning user. Not checked against the user table.
    pub user_id: String,
    pub wallet_address: String,
    pub amount: String,
    /// Free text, e.g. `bug_fix` or `contribution`.
    pub reason: String,
    pub claimed: bool,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reward {
    pub fn is_claimable(&self) -> bool {
        !self.claimed
    }
}

/// Fields supplied by the caller when crediting a reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReward {
    pub user_id: String,
    pub wallet_address: String,
    pub amount: String,
    pub reason: String,
    /// Defaults to `false` when absent.
    pub claimed: Option<bool>,
}
