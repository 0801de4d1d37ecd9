// Copyright (c) 2026 XARO Contributors. MIT License.
// See LICENSE for details.

//! # XARO Ledger
//!
//! Everything the wallet backend knows about its records, with no HTTP in
//! sight. The server crate wires these pieces behind axum; tests use them
//! directly.
//!
//! ## Modules
//!
//! - **config**: Constants shared by the store, the schemas and the server.
//! - **address**: Advisory wallet-address helpers (format check, display).
//! - **code**: Transaction code derivation from a transaction hash.
//! - **model**: User, Transaction and Reward records and their creation types.
//! - **validation**: Turns raw JSON request bodies into typed creation records.
//! - **storage**: The `Storage` trait and its in-memory implementation.
//!
//! Nothing here touches the blockchain. Hashes and addresses are whatever
//! the client says they are.

pub mod address;
pub mod code;
pub mod config;
pub mod model;
pub mod storage;
pub mod validation;

pub use code::{generate_transaction_code, CodeError};
pub use model::{
    NewReward, NewTransaction, NewUser, Reward, StatusUpdate, Transaction, TransactionStatus,
    TransactionType, User,
};
pub use storage::{MemStorage, Storage, StorageError, StorageResult};
pub use validation::{FieldError, ValidationErrors};
