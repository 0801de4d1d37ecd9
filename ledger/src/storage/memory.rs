//! In-memory record store.
//!
//! Three hash tables keyed by record id, all behind a single
//! `parking_lot::RwLock`. Reads share the lock; every mutation holds the
//! write lock for its whole read-modify-write, which makes
//! [`Storage::claim_reward`] and [`Storage::update_transaction_status`]
//! atomic within the process. Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{RecordCounts, Storage, StorageResult};
use crate::address::shorten_address;
use crate::model::{
    NewReward, NewTransaction, NewUser, Reward, StatusUpdate, Transaction, TransactionStatus,
    User,
};

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

impl Timestamped for User {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Timestamped for Transaction {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Timestamped for Reward {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug)]
struct Row<T> {
    /// Insertion sequence; breaks `created_at` ties.
    seq: u64,
    record: T,
}

#[derive(Debug)]
struct Table<T> {
    rows: HashMap<Uuid, Row<T>>,
    next_seq: u64,
}

impl<T: Clone + Timestamped> Table<T> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
            next_seq: 0,
        }
    }

    fn insert(&mut self, id: Uuid, record: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.rows.insert(id, Row { seq, record });
    }

    fn get(&self, id: &Uuid) -> Option<T> {
        self.rows.get(id).map(|row| row.record.clone())
    }

    fn get_mut(&mut self, id: &Uuid) -> Option<&mut T> {
        self.rows.get_mut(id).map(|row| &mut row.record)
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.rows
            .values()
            .map(|row| &row.record)
            .find(|r| pred(*r))
            .cloned()
    }

    /// Records matching `pred`, newest first.
    fn filter_newest_first(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        let mut rows: Vec<&Row<T>> = self.rows.values().filter(|row| pred(&row.record)).collect();
        rows.sort_by(|a, b| {
            b.record
                .created_at()
                .cmp(&a.record.created_at())
                .then_with(|| b.seq.cmp(&a.seq))
        });
        rows.into_iter().map(|row| row.record.clone()).collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug)]
struct Tables {
    users: Table<User>,
    transactions: Table<Transaction>,
    rewards: Table<Reward>,
}

// ---------------------------------------------------------------------------
// MemStorage
// ---------------------------------------------------------------------------

/// Process-local [`Storage`] implementation.
///
/// Construct one at startup and share it behind an `Arc`. Tests build a
/// fresh instance each, so no state leaks between them.
#[derive(Debug)]
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                users: Table::new(),
                transactions: Table::new(),
                rewards: Table::new(),
            }),
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemStorage {
    // -- Users --------------------------------------------------------------

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.tables.read().users.get(&id))
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self.tables.read().users.find(|u| u.username == username))
    }

    async fn get_user_by_wallet_address(&self, address: &str) -> StorageResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .find(|u| u.wallet_address.as_deref() == Some(address)))
    }

    async fn create_user(&self, new: NewUser) -> StorageResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            password: new.password,
            wallet_address: new.wallet_address,
            created_at: Utc::now(),
        };
        self.tables.write().users.insert(user.id, user.clone());
        tracing::debug!(id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    async fn update_user_wallet(&self, id: Uuid, address: &str) -> StorageResult<Option<User>> {
        let mut tables = self.tables.write();
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        user.wallet_address = Some(address.to_string());
        tracing::debug!(id = %id, wallet = %shorten_address(address), "user wallet updated");
        Ok(Some(user.clone()))
    }

    // -- Transactions -------------------------------------------------------

    async fn get_transaction(&self, id: Uuid) -> StorageResult<Option<Transaction>> {
        Ok(self.tables.read().transactions.get(&id))
    }

    async fn get_transaction_by_hash(&self, tx_hash: &str) -> StorageResult<Option<Transaction>> {
        Ok(self.tables.read().transactions.find(|tx| tx.tx_hash == tx_hash))
    }

    async fn get_transactions_by_address(&self, address: &str) -> StorageResult<Vec<Transaction>> {
        Ok(self
            .tables
            .read()
            .transactions
            .filter_newest_first(|tx| tx.involves(address)))
    }

    async fn create_transaction(&self, new: NewTransaction) -> StorageResult<Transaction> {
        let tx = Transaction {
            id: Uuid::new_v4(),
            tx_hash: new.tx_hash,
            transaction_code: new.transaction_code,
            from_address: new.from_address,
            to_address: new.to_address,
            amount: new.amount,
            kind: new.kind,
            status: new.status.unwrap_or_default(),
            block_height: new.block_height,
            created_at: Utc::now(),
            confirmed_at: None,
        };
        self.tables.write().transactions.insert(tx.id, tx.clone());
        tracing::debug!(
            id = %tx.id,
            tx_hash = %tx.tx_hash,
            kind = %tx.kind,
            status = %tx.status,
            "transaction recorded"
        );
        Ok(tx)
    }

    async fn update_transaction_status(
        &self,
        id: Uuid,
        update: StatusUpdate,
    ) -> StorageResult<Option<Transaction>> {
        let mut tables = self.tables.write();
        let Some(tx) = tables.transactions.get_mut(&id) else {
            return Ok(None);
        };

        let previous = tx.status;
        tx.status = update.status;
        if let Some(height) = update.block_height {
            tx.block_height = Some(height);
        }
        // A later move away from Confirmed keeps the old timestamp.
        if update.status == TransactionStatus::Confirmed {
            tx.confirmed_at = Some(Utc::now());
        }

        tracing::debug!(
            id = %id,
            from = %previous,
            to = %tx.status,
            block_height = ?tx.block_height,
            "transaction status updated"
        );
        Ok(Some(tx.clone()))
    }

    // -- Rewards ------------------------------------------------------------

    async fn get_reward(&self, id: Uuid) -> StorageResult<Option<Reward>> {
        Ok(self.tables.read().rewards.get(&id))
    }

    async fn get_rewards_by_user(&self, user_id: &str) -> StorageResult<Vec<Reward>> {
        Ok(self
            .tables
            .read()
            .rewards
            .filter_newest_first(|r| r.user_id == user_id))
    }

    async fn get_unclaimed_rewards_by_address(&self, address: &str) -> StorageResult<Vec<Reward>> {
        Ok(self
            .tables
            .read()
            .rewards
            .filter_newest_first(|r| r.wallet_address == address && r.is_claimable()))
    }

    async fn create_reward(&self, new: NewReward) -> StorageResult<Reward> {
        let now = Utc::now();
        let claimed = new.claimed.unwrap_or(false);
        let reward = Reward {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            wallet_address: new.wallet_address,
            amount: new.amount,
            reason: new.reason,
            claimed,
            // Keeps claimed_at in step with claimed for rewards created pre-claimed.
            claimed_at: claimed.then_some(now),
            created_at: now,
        };
        self.tables.write().rewards.insert(reward.id, reward.clone());
        tracing::debug!(
            id = %reward.id,
            wallet = %shorten_address(&reward.wallet_address),
            amount = %reward.amount,
            reason = %reward.reason,
            "reward created"
        );
        Ok(reward)
    }

    async fn claim_reward(&self, id: Uuid) -> StorageResult<Option<Reward>> {
        let mut tables = self.tables.write();
        let Some(reward) = tables.rewards.get_mut(&id) else {
            return Ok(None);
        };
        if !reward.is_claimable() {
            return Ok(None);
        }

        reward.claimed = true;
        reward.claimed_at = Some(Utc::now());
        tracing::debug!(id = %id, amount = %reward.amount, "reward claimed");
        Ok(Some(reward.clone()))
    }

    // -- Introspection ------------------------------------------------------

    async fn counts(&self) -> StorageResult<RecordCounts> {
        let tables = self.tables.read();
        Ok(RecordCounts {
            users: tables.users.len(),
            transactions: tables.transactions.len(),
            rewards: tables.rewards.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionType;

    fn new_tx(hash: &str, from: &str, to: &str) -> NewTransaction {
        NewTransaction {
            tx_hash: hash.into(),
            transaction_code: "0".repeat(45),
            from_address: from.into(),
            to_address: to.into(),
            amount: "1".into(),
            kind: TransactionType::Transfer,
            status: None,
            block_height: None,
        }
    }

    #[tokio::test]
    async fn test_ties_on_created_at_break_by_insertion_order() {
        let store = MemStorage::new();
        let a = store.create_transaction(new_tx("0x01", "x", "y")).await.unwrap();
        let b = store.create_transaction(new_tx("0x02", "x", "y")).await.unwrap();

        // Force identical timestamps.
        {
            let mut tables = store.tables.write();
            let stamp = a.created_at;
            tables.transactions.get_mut(&b.id).unwrap().created_at = stamp;
        }

        let listed = store.get_transactions_by_address("x").await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_created_confirmed_has_no_confirmed_at_until_updated() {
        let store = MemStorage::new();
        let tx = store
            .create_transaction(NewTransaction {
                status: Some(TransactionStatus::Confirmed),
                block_height: Some(7),
                ..new_tx("0x03", "x", "y")
            })
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Confirmed);
        assert_eq!(tx.block_height, Some(7));
        assert!(tx.confirmed_at.is_none());

        let stored = store.get_transaction(tx.id).await.unwrap().unwrap();
        assert!(stored.confirmed_at.is_none());

        // Only a status update stamps it.
        let updated = store
            .update_transaction_status(
                tx.id,
                StatusUpdate {
                    status: TransactionStatus::Confirmed,
                    block_height: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.confirmed_at.is_some());
        assert_eq!(updated.block_height, Some(7));
    }

    #[tokio::test]
    async fn test_pre_claimed_reward_has_claimed_at() {
        let store = MemStorage::new();
        let reward = store
            .create_reward(NewReward {
                user_id: "u".into(),
                wallet_address: "w".into(),
                amount: "1".into(),
                reason: "seed".into(),
                claimed: Some(true),
            })
            .await
            .unwrap();
        assert!(reward.claimed);
        assert!(reward.claimed_at.is_some());
        assert!(store.claim_reward(reward.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counts_track_inserts() {
        let store = MemStorage::new();
        store.create_transaction(new_tx("0x01", "a", "b")).await.unwrap();
        store
            .create_user(NewUser {
                username: "alice".into(),
                password: "pw".into(),
                wallet_address: None,
            })
            .await
            .unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(
            counts,
            RecordCounts {
                users: 1,
                transactions: 1,
                rewards: 0
            }
        );
    }
}
