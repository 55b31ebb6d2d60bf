//! Account domain entity.
//! Framework-agnostic representation of a user's pay account.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A monetary account owned by exactly one user for its lifetime.
///
/// `balance` is in minor currency units and never goes negative; only the
/// ledger service mutates it. `connected` marks the single externally-linked
/// account a user currently has (at most one per user).
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub account_number: String,
    pub user_id: i64,
    pub bank_code: String,
    pub balance: i64,
    pub connected: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a fresh account (balance starts at 0).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub account_number: String,
    pub user_id: i64,
    pub bank_code: String,
}

impl NewAccount {
    pub fn generate(user_id: i64, bank_code: &str) -> Self {
        Self {
            account_number: generate_account_number(bank_code),
            user_id,
            bank_code: bank_code.to_string(),
        }
    }
}

/// Builds an opaque, externally visible account number from the bank code and
/// 11 random digits. Global uniqueness is enforced by the store's unique
/// constraint; a collision on 11 random digits is not worth a retry loop.
fn generate_account_number(bank_code: &str) -> String {
    let digits = Uuid::new_v4().as_u128() % 100_000_000_000;
    format!(
        "{}-{:04}-{:07}",
        bank_code,
        digits / 10_000_000,
        digits % 10_000_000
    )
}
