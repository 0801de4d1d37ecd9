//! Record types.
//!
//! Each entity comes in two shapes: the stored record (`User`,
//! `Transaction`, `Reward`) carrying store-assigned fields such as `id` and
//! `created_at`, and the creation record (`NewUser`, ...) that callers hand
//! to the store. Creation records only come out of [`crate::validation`] or
//! from code that builds them directly, so they are always well-formed.
//!
//! All records serialize with camelCase field names; that is the wire
//! format the client reads.

pub mod reward;
pub mod transaction;
pub mod user;

pub use reward::{NewReward, Reward};
pub use transaction::{NewTransaction, StatusUpdate, Transaction, TransactionStatus, TransactionType};
pub use user::{NewUser, User};
