//! # Storage Module
//!
//! The record store behind the API. Handlers only ever talk to the
//! [`Storage`] trait, so the in-memory implementation can be swapped for a
//! durable one without touching them.
//!
//! ```text
//! memory.rs: MemStorage: three keyed tables behind one RwLock
//! ```
//!
//! ## Contract
//!
//! - "Not found" is never an error. Lookups return `None` or an empty `Vec`;
//!   [`Storage::update_transaction_status`] and [`Storage::claim_reward`]
//!   return `None` when there is nothing to act on.
//! - [`StorageError`] is reserved for backend failures. `MemStorage` never
//!   produces one.
//! - `create_*` does not check uniqueness of usernames or transaction
//!   hashes. Callers own that.
//! - Every list documented as "newest first" orders by `created_at`
//!   descending, later inserts first on ties.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{
    NewReward, NewTransaction, NewUser, Reward, StatusUpdate, Transaction, User,
};

pub use memory::MemStorage;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors a storage backend can raise.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend itself failed (I/O, connection, corruption).
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Number of records held per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub users: usize,
    pub transactions: usize,
    pub rewards: usize,
}

// ---------------------------------------------------------------------------
// Storage Trait
// ---------------------------------------------------------------------------

/// Capability set of a record store: create, get, filter and update for
/// each of the three entity kinds.
#[async_trait]
pub trait Storage: Send + Sync {
    // -- Users --------------------------------------------------------------

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;

    async fn get_user_by_wallet_address(&self, address: &str) -> StorageResult<Option<User>>;

    async fn create_user(&self, new: NewUser) -> StorageResult<User>;

    /// Replaces the user's wallet address. `None` if the user is unknown.
    async fn update_user_wallet(&self, id: Uuid, address: &str) -> StorageResult<Option<User>>;

    // -- Transactions -------------------------------------------------------

    async fn get_transaction(&self, id: Uuid) -> StorageResult<Option<Transaction>>;

    async fn get_transaction_by_hash(&self, tx_hash: &str) -> StorageResult<Option<Transaction>>;

    /// All transactions sent from or to `address`, newest first.
    async fn get_transactions_by_address(&self, address: &str) -> StorageResult<Vec<Transaction>>;

    async fn create_transaction(&self, new: NewTransaction) -> StorageResult<Transaction>;

    /// Applies `update` to the transaction. Sets `confirmed_at` to now iff
    /// the new status is `confirmed`; never clears it. `None` if the id is
    /// unknown.
    async fn update_transaction_status(
        &self,
        id: Uuid,
        update: StatusUpdate,
    ) -> StorageResult<Option<Transaction>>;

    // -- Rewards ------------------------------------------------------------

    async fn get_reward(&self, id: Uuid) -> StorageResult<Option<Reward>>;

    /// All rewards of `user_id`, claimed or not, newest first.
    async fn get_rewards_by_user(&self, user_id: &str) -> StorageResult<Vec<Reward>>;

    /// Unclaimed rewards credited to `address`, newest first.
    async fn get_unclaimed_rewards_by_address(&self, address: &str) -> StorageResult<Vec<Reward>>;

    async fn create_reward(&self, new: NewReward) -> StorageResult<Reward>;

    /// Marks the reward claimed. `None` if the id is unknown or the reward
    /// was already claimed; the two cases are indistinguishable.
    async fn claim_reward(&self, id: Uuid) -> StorageResult<Option<Reward>>;

    // -- Introspection ------------------------------------------------------

    async fn counts(&self) -> StorageResult<RecordCounts>;
}
