//! Storage ports for the ledger core.
//! Adapters implement these; services only see the traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Account, NewAccount, PaginatedHistory, PayHistory, PayType};
use crate::error::LedgerError;

/// Owns account records: identity, ownership, balance, connection state.
/// Balances are only ever mutated through [`TransactionRecorder`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert_account(&self, new: NewAccount) -> Result<Account, LedgerError>;

    async fn find_by_number(&self, account_number: &str) -> Result<Option<Account>, LedgerError>;

    async fn find_by_id(&self, account_id: i64) -> Result<Option<Account>, LedgerError>;

    async fn find_all_for_user(
        &self,
        user_id: i64,
        bank_code: Option<&str>,
    ) -> Result<Vec<Account>, LedgerError>;

    /// The user's currently connected account, if any.
    async fn connected_account(&self, user_id: i64) -> Result<Option<Account>, LedgerError>;

    /// Marks `account_id` as the user's connected account, clearing any prior
    /// connection for that user in the same atomic unit.
    async fn connect_account(&self, user_id: i64, account_id: i64) -> Result<Account, LedgerError>;
}

/// Charge posting: credit one account and record the event.
#[derive(Debug, Clone)]
pub struct ChargePosting {
    pub account_id: i64,
    pub amount: i64,
    pub counterparty_name: String,
    pub counterparty_number: String,
    pub description: String,
}

/// Transfer posting: move `amount` from `sender` to `target` and record both
/// legs. Accounts are resolved by the caller; the funds check happens inside
/// the posting, under the row locks.
#[derive(Debug, Clone)]
pub struct TransferPosting {
    pub sender: Account,
    pub target: Account,
    pub amount: i64,
    pub description: String,
}

/// Both legs of a committed transfer, sharing amount and timestamp.
#[derive(Debug, Clone)]
pub struct TransferLegs {
    pub outgoing: PayHistory,
    pub incoming: PayHistory,
}

/// Appends immutable history entries as part of each balance mutation.
/// Each method is one atomic unit: the balance write(s) and history append(s)
/// commit together or not at all.
#[async_trait]
pub trait TransactionRecorder: Send + Sync {
    async fn post_charge(&self, posting: ChargePosting) -> Result<PayHistory, LedgerError>;

    /// Fails with `InsufficientFunds` (checked under lock) or `AccountNotFound`
    /// if either row vanished; on any failure neither leg is visible.
    async fn post_transfer(&self, posting: TransferPosting) -> Result<TransferLegs, LedgerError>;
}

/// Filter over one account's history. Bounds are half-open timestamps
/// (`from` inclusive, `until` exclusive); `None` means unbounded.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub pay_type: Option<PayType>,
}

/// 1-indexed page request, validated by the history service before it
/// reaches a store.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    /// Zero-based row offset. Saturates instead of overflowing, so an
    /// absurdly large page number lands past the end of any result set and
    /// yields an empty page rather than a panic or a storage error.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }
}

/// Read-only, newest-first view over recorded history.
#[async_trait]
pub trait HistoryReader: Send + Sync {
    async fn find_history(
        &self,
        account_id: i64,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<PaginatedHistory<PayHistory>, LedgerError>;
}

/// Everything the ledger core needs from durable storage.
pub trait LedgerStore: AccountStore + TransactionRecorder + HistoryReader {}

impl<T: AccountStore + TransactionRecorder + HistoryReader> LedgerStore for T {}
