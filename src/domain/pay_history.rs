//! PayHistory domain entity.
//! Immutable record of one balance-affecting event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of balance-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayType {
    Charge,
    TransferOut,
    TransferIn,
}

impl PayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayType::Charge => "CHARGE",
            PayType::TransferOut => "TRANSFER_OUT",
            PayType::TransferIn => "TRANSFER_IN",
        }
    }
}

impl fmt::Display for PayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHARGE" => Ok(PayType::Charge),
            "TRANSFER_OUT" => Ok(PayType::TransferOut),
            "TRANSFER_IN" => Ok(PayType::TransferIn),
            other => Err(format!("unknown pay type: {other}")),
        }
    }
}

/// One ledger entry on one account. Written exclusively by the ledger
/// service, never updated or deleted. A transfer writes exactly two entries
/// (one per account) with equal amount and timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct PayHistory {
    pub id: i64,
    pub account_id: i64,
    /// Positive magnitude in minor units; direction comes from `pay_type`.
    pub amount: i64,
    /// Owning account's balance immediately after this event committed.
    pub balance_after: i64,
    pub pay_type: PayType,
    pub counterparty_name: String,
    pub counterparty_number: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
