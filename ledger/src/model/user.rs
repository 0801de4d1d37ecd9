//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account holder.
///
/// The password is kept exactly as supplied and never leaves the process:
/// it is skipped on serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub wallet_address: Option<String>,
}
