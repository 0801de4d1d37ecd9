//! Integration tests for the record store.
//!
//! Each test builds its own `MemStorage` and goes through the `Storage`
//! trait only, the same way the API layer does. No shared state between
//! tests.

use std::sync::Arc;
use std::time::Duration;

use xaro_ledger::model::{
    NewReward, NewTransaction, NewUser, StatusUpdate, TransactionStatus, TransactionType,
};
use xaro_ledger::{generate_transaction_code, MemStorage, Storage};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn store() -> Arc<dyn Storage> {
    Arc::new(MemStorage::new())
}

fn transfer(hash: &str, from: &str, to: &str) -> NewTransaction {
    NewTransaction {
        tx_hash: hash.to_string(),
        transaction_code: generate_transaction_code(hash).expect("valid test hash"),
        from_address: from.to_string(),
        to_address: to.to_string(),
        amount: "10.000000".to_string(),
        kind: TransactionType::Transfer,
        status: None,
        block_height: None,
    }
}

fn reward_for(wallet: &str, user_id: &str) -> NewReward {
    NewReward {
        user_id: user_id.to_string(),
        wallet_address: wallet.to_string(),
        amount: "25".to_string(),
        reason: "bug_fix".to_string(),
        claimed: None,
    }
}

/// Keeps consecutive inserts on distinct timestamps.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(2)).await;
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_transaction_is_found_by_hash() {
    let store = store();
    let created = store
        .create_transaction(transfer("0xaa01", "0xalice", "0xbob"))
        .await
        .unwrap();

    let fetched = store.get_transaction_by_hash("0xaa01").await.unwrap();
    assert_eq!(fetched, Some(created.clone()));

    let by_id = store.get_transaction(created.id).await.unwrap();
    assert_eq!(by_id, Some(created));

    assert!(store.get_transaction_by_hash("0xffff").await.unwrap().is_none());
}

#[tokio::test]
async fn new_transaction_is_pending_until_confirmed() {
    let store = store();
    let tx = store
        .create_transaction(transfer("0xaa02", "0xalice", "0xbob"))
        .await
        .unwrap();
    assert_eq!(tx.status, TransactionStatus::Pending);
    assert!(tx.confirmed_at.is_none());
    assert!(tx.block_height.is_none());

    let updated = store
        .update_transaction_status(
            tx.id,
            StatusUpdate {
                status: TransactionStatus::Confirmed,
                block_height: Some(1024),
            },
        )
        .await
        .unwrap()
        .expect("transaction exists");

    assert_eq!(updated.status, TransactionStatus::Confirmed);
    assert!(updated.confirmed_at.is_some());
    assert_eq!(updated.block_height, Some(1024));
}

#[tokio::test]
async fn status_update_without_height_keeps_previous_height() {
    let store = store();
    let mut new = transfer("0xaa03", "0xalice", "0xbob");
    new.block_height = Some(7);
    let tx = store.create_transaction(new).await.unwrap();

    let updated = store
        .update_transaction_status(
            tx.id,
            StatusUpdate {
                status: TransactionStatus::Failed,
                block_height: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.status, TransactionStatus::Failed);
    assert_eq!(updated.block_height, Some(7));
    assert!(updated.confirmed_at.is_none());
}

#[tokio::test]
async fn reverting_a_confirmed_transaction_keeps_confirmed_at() {
    let store = store();
    let tx = store
        .create_transaction(transfer("0xaa04", "0xalice", "0xbob"))
        .await
        .unwrap();

    let confirmed = store
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

    let reverted = store
        .update_transaction_status(
            tx.id,
            StatusUpdate {
                status: TransactionStatus::Failed,
                block_height: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reverted.status, TransactionStatus::Failed);
    assert_eq!(reverted.confirmed_at, confirmed.confirmed_at);
}

#[tokio::test]
async fn status_update_on_unknown_id_is_none() {
    let store = store();
    let result = store
        .update_transaction_status(
            uuid::Uuid::new_v4(),
            StatusUpdate {
                status: TransactionStatus::Confirmed,
                block_height: None,
            },
        )
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn address_filter_matches_sender_or_recipient_newest_first() {
    let store = store();
    let a = store
        .create_transaction(transfer("0x0a", "X", "Y"))
        .await
        .unwrap();
    tick().await;
    let b = store
        .create_transaction(transfer("0x0b", "Y", "X"))
        .await
        .unwrap();
    tick().await;
    store
        .create_transaction(transfer("0x0c", "Z", "W"))
        .await
        .unwrap();

    let listed = store.get_transactions_by_address("X").await.unwrap();
    let ids: Vec<_> = listed.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);

    assert!(store
        .get_transactions_by_address("nobody")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn duplicate_hashes_are_not_rejected() {
    // Uniqueness is the caller's job; the store records both.
    let store = store();
    store
        .create_transaction(transfer("0xdd", "A", "B"))
        .await
        .unwrap();
    store
        .create_transaction(transfer("0xdd", "A", "B"))
        .await
        .unwrap();
    assert_eq!(store.get_transactions_by_address("A").await.unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reward_can_be_claimed_exactly_once() {
    let store = store();
    let reward = store
        .create_reward(reward_for("0xwallet", "user-1"))
        .await
        .unwrap();
    assert!(!reward.claimed);
    assert!(reward.claimed_at.is_none());

    let claimed = store
        .claim_reward(reward.id)
        .await
        .unwrap()
        .expect("first claim succeeds");
    assert!(claimed.claimed);
    assert!(claimed.claimed_at.is_some());

    assert!(store.claim_reward(reward.id).await.unwrap().is_none());
    assert!(store
        .claim_reward(uuid::Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn unclaimed_filter_skips_claimed_rewards() {
    let store = store();
    let first = store
        .create_reward(reward_for("0xwallet", "user-1"))
        .await
        .unwrap();
    tick().await;
    let second = store
        .create_reward(reward_for("0xwallet", "user-1"))
        .await
        .unwrap();
    store
        .create_reward(reward_for("0xother", "user-2"))
        .await
        .unwrap();

    store.claim_reward(first.id).await.unwrap().unwrap();

    let unclaimed = store
        .get_unclaimed_rewards_by_address("0xwallet")
        .await
        .unwrap();
    assert_eq!(unclaimed.len(), 1);
    assert_eq!(unclaimed[0].id, second.id);

    // The per-user listing keeps claimed rewards, newest first.
    let all = store.get_rewards_by_user("user-1").await.unwrap();
    let ids: Vec<_> = all.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_have_a_single_winner() {
    let store = store();
    let reward = store
        .create_reward(reward_for("0xwallet", "user-1"))
        .await
        .unwrap();

    let id = reward.id;
    let attempts = (0..16).map(|_| {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.claim_reward(id).await })
    });

    let results = futures::future::join_all(attempts).await;
    let winners = results
        .into_iter()
        .map(|r| r.expect("task completed").expect("storage ok"))
        .filter(Option::is_some)
        .count();
    assert_eq!(winners, 1);
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_lookup_by_name_and_wallet() {
    let store = store();
    let user = store
        .create_user(NewUser {
            username: "alice".into(),
            password: "pw".into(),
            wallet_address: None,
        })
        .await
        .unwrap();
    assert!(user.wallet_address.is_none());

    assert_eq!(
        store.get_user_by_username("alice").await.unwrap().map(|u| u.id),
        Some(user.id)
    );
    assert!(store
        .get_user_by_wallet_address("0xalice")
        .await
        .unwrap()
        .is_none());

    let updated = store
        .update_user_wallet(user.id, "0xalice")
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(updated.wallet_address.as_deref(), Some("0xalice"));

    let by_wallet = store
        .get_user_by_wallet_address("0xalice")
        .await
        .unwrap()
        .expect("wallet linked");
    assert_eq!(by_wallet.id, user.id);
    assert_eq!(by_wallet.password, "pw");

    assert!(store
        .update_user_wallet(uuid::Uuid::new_v4(), "0x1")
        .await
        .unwrap()
        .is_none());
}
