//! Request schemas.
//!
//! Request bodies arrive as *drafts*: structs whose every field is an
//! optional raw JSON value. A draft's `validate` checks all fields, collects
//! every failure into [`ValidationErrors`], and only returns the typed
//! creation record when nothing failed. Nothing downstream of this module
//! ever sees an untyped body.
//!
//! A JSON `null` is treated the same as an absent field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::code::is_transaction_code;
use crate::config::{AMOUNT_PRECISION, AMOUNT_SCALE, TRANSACTION_CODE_LENGTH};
use crate::model::{
    NewReward, NewTransaction, NewUser, StatusUpdate, TransactionStatus, TransactionType,
};

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

/// One failed check on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Wire name of the field (camelCase).
    pub field: String,
    pub message: String,
}

/// Every failed check for a request body, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// A single error not tied to a schema field, e.g. a body that is not
    /// JSON at all.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns `true` if at least one error names `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        for (i, e) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{}{} {}", sep, e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ---------------------------------------------------------------------------
// Field Checks
// ---------------------------------------------------------------------------

fn required_string(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> Option<String> {
    match value {
        None => {
            errors.push(field, "is required");
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.push(field, "must not be empty");
            None
        }
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            errors.push(field, "must be a string");
            None
        }
    }
}

/// `Ok(None)` when absent, `Err(())` after recording an error.
fn optional_string(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Value>,
) -> Result<Option<String>, ()> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => {
            errors.push(field, "must be a string");
            Err(())
        }
    }
}

fn optional_bool(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> Option<bool> {
    match value {
        None => None,
        Some(Value::Bool(b)) => Some(b),
        Some(_) => {
            errors.push(field, "must be a boolean");
            None
        }
    }
}

fn optional_block_height(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Value>,
) -> Option<u64> {
    match value {
        None => None,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(h) => Some(h),
            None => {
                errors.push(field, "must be a non-negative integer");
                None
            }
        },
        Some(_) => {
            errors.push(field, "must be a non-negative integer");
            None
        }
    }
}

fn enum_value<T: FromStr>(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<String>,
    allowed: &[&str],
) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.push(field, format!("must be one of: {}", allowed.join(", ")));
            None
        }
    }
}

fn check_amount(errors: &mut ValidationErrors, field: &str, raw: &str) -> bool {
    let shape_ok = raw.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && raw.bytes().filter(|&b| b == b'.').count() <= 1
        && raw.bytes().any(|b| b.is_ascii_digit());
    if !shape_ok {
        errors.push(field, "must be a non-negative decimal string");
        return false;
    }

    let amount = match Decimal::from_str(raw) {
        Ok(d) => d,
        Err(_) => {
            errors.push(field, "must be a non-negative decimal string");
            return false;
        }
    };

    if amount.scale() > AMOUNT_SCALE {
        errors.push(
            field,
            format!("must have at most {} fractional digits", AMOUNT_SCALE),
        );
        return false;
    }

    let limit = Decimal::from(10i64.pow(AMOUNT_PRECISION - AMOUNT_SCALE));
    if amount >= limit {
        errors.push(field, format!("must be less than {}", limit));
        return false;
    }

    true
}

fn required_amount(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> Option<String> {
    let raw = required_string(errors, field, value)?;
    check_amount(errors, field, &raw).then_some(raw)
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

/// Unvalidated body of `POST /api/transactions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub tx_hash: Option<Value>,
    pub transaction_code: Option<Value>,
    pub from_address: Option<Value>,
    pub to_address: Option<Value>,
    pub amount: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub status: Option<Value>,
    pub block_height: Option<Value>,
}

impl TransactionDraft {
    pub fn validate(self) -> Result<NewTransaction, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let tx_hash = required_string(&mut errors, "txHash", self.tx_hash);
        let transaction_code =
            required_string(&mut errors, "transactionCode", self.transaction_code).and_then(
                |code| {
                    if is_transaction_code(&code) {
                        Some(code)
                    } else {
                        errors.push(
                            "transactionCode",
                            format!("must be exactly {} digits", TRANSACTION_CODE_LENGTH),
                        );
                        None
                    }
                },
            );
        let from_address = required_string(&mut errors, "fromAddress", self.from_address);
        let to_address = required_string(&mut errors, "toAddress", self.to_address);
        let amount = required_amount(&mut errors, "amount", self.amount);

        let kind_raw = required_string(&mut errors, "type", self.kind);
        let kind = enum_value::<TransactionType>(&mut errors, "type", kind_raw, &TransactionType::ALL);

        let status = match optional_string(&mut errors, "status", self.status) {
            Ok(raw) => enum_value::<TransactionStatus>(&mut errors, "status", raw, &TransactionStatus::ALL),
            Err(()) => None,
        };
        let block_height = optional_block_height(&mut errors, "blockHeight", self.block_height);

        match (tx_hash, transaction_code, from_address, to_address, amount, kind) {
            (Some(tx_hash), Some(transaction_code), Some(from_address), Some(to_address), Some(amount), Some(kind)) => {
                errors.into_result(NewTransaction {
                    tx_hash,
                    transaction_code,
                    from_address,
                    to_address,
                    amount,
                    kind,
                    status,
                    block_height,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Unvalidated body of `PATCH /api/transactions/:id/status`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateDraft {
    pub status: Option<Value>,
    pub block_height: Option<Value>,
}

impl StatusUpdateDraft {
    pub fn validate(self) -> Result<StatusUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let raw = required_string(&mut errors, "status", self.status);
        let status = enum_value::<TransactionStatus>(&mut errors, "status", raw, &TransactionStatus::ALL);
        let block_height = optional_block_height(&mut errors, "blockHeight", self.block_height);

        match status {
            Some(status) => errors.into_result(StatusUpdate {
                status,
                block_height,
            }),
            None => Err(errors),
        }
    }
}

/// Unvalidated body of `POST /api/rewards`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardDraft {
    pub user_id: Option<Value>,
    pub wallet_address: Option<Value>,
    pub amount: Option<Value>,
    pub reason: Option<Value>,
    pub claimed: Option<Value>,
}

impl RewardDraft {
    pub fn validate(self) -> Result<NewReward, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let user_id = required_string(&mut errors, "userId", self.user_id);
        let wallet_address = required_string(&mut errors, "walletAddress", self.wallet_address);
        let amount = required_amount(&mut errors, "amount", self.amount);
        let reason = required_string(&mut errors, "reason", self.reason);
        let claimed = optional_bool(&mut errors, "claimed", self.claimed);

        match (user_id, wallet_address, amount, reason) {
            (Some(user_id), Some(wallet_address), Some(amount), Some(reason)) => {
                errors.into_result(NewReward {
                    user_id,
                    wallet_address,
                    amount,
                    reason,
                    claimed,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Unvalidated body of `POST /api/users`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub username: Option<Value>,
    pub password: Option<Value>,
    pub wallet_address: Option<Value>,
}

impl UserDraft {
    pub fn validate(self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let username = required_string(&mut errors, "username", self.username);
        let password = required_string(&mut errors, "password", self.password);
        let wallet_address = optional_string(&mut errors, "walletAddress", self.wallet_address)
            .ok()
            .flatten()
            .filter(|a| !a.is_empty());

        match (username, password) {
            (Some(username), Some(password)) => errors.into_result(NewUser {
                username,
                password,
                wallet_address,
            }),
            _ => Err(errors),
        }
    }
}

/// Unvalidated body of `PATCH /api/users/:id/wallet`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdateDraft {
    pub wallet_address: Option<Value>,
}

impl WalletUpdateDraft {
    pub fn validate(self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        match required_string(&mut errors, "walletAddress", self.wallet_address) {
            Some(addr) => Ok(addr),
            None => Err(errors),
        }
    }
}

/// Unvalidated body of `POST /api/generate-code`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRequestDraft {
    pub tx_hash: Option<Value>,
}

impl CodeRequestDraft {
    /// Only checks presence. Whether the hash decodes is the code
    /// generator's call.
    pub fn validate(self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        match required_string(&mut errors, "txHash", self.tx_hash) {
            Some(hash) => Ok(hash),
            None => Err(errors),
        }
    }
}
