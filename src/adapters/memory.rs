//! In-memory implementation of the ledger storage ports.
//!
//! One async mutex guards the whole ledger, so every posting is trivially
//! atomic and mutations on any account serialize. Used by the test suites
//! and for running the service without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::{bank, Account, NewAccount, PaginatedHistory, PayHistory, PayType};
use crate::error::LedgerError;
use crate::ports::{
    AccountStore, ChargePosting, HistoryFilter, HistoryReader, PageRequest, TransactionRecorder,
    TransferLegs, TransferPosting,
};

#[derive(Default)]
struct Inner {
    accounts: HashMap<i64, Account>,
    by_number: HashMap<String, i64>,
    history: Vec<PayHistory>,
    next_account_id: i64,
    next_history_id: i64,
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    inner: Mutex<Inner>,
    fail_next_posting: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next posting fail with `StorageUnavailable` before any
    /// write becomes visible. Lets tests exercise the all-or-nothing
    /// guarantee without a real storage outage.
    pub fn fail_next_posting(&self) {
        self.fail_next_posting.store(true, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> Result<(), LedgerError> {
        if self.fail_next_posting.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::StorageUnavailable(
                "injected posting failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl Inner {
    fn append_history(&mut self, record: PayHistory) -> PayHistory {
        self.history.push(record.clone());
        record
    }

    fn next_history_id(&mut self) -> i64 {
        self.next_history_id += 1;
        self.next_history_id
    }
}

#[async_trait]
impl AccountStore for MemoryLedgerStore {
    async fn insert_account(&self, new: NewAccount) -> Result<Account, LedgerError> {
        let mut inner = self.inner.lock().await;
        if inner.by_number.contains_key(&new.account_number) {
            return Err(LedgerError::StorageUnavailable(format!(
                "duplicate account number: {}",
                new.account_number
            )));
        }

        inner.next_account_id += 1;
        let account = Account {
            id: inner.next_account_id,
            account_number: new.account_number.clone(),
            user_id: new.user_id,
            bank_code: new.bank_code,
            balance: 0,
            connected: false,
            created_at: Utc::now(),
        };
        inner.by_number.insert(new.account_number, account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_number(&self, account_number: &str) -> Result<Option<Account>, LedgerError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .by_number
            .get(account_number)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, account_id: i64) -> Result<Option<Account>, LedgerError> {
        let inner = self.inner.lock().await;
        Ok(inner.accounts.get(&account_id).cloned())
    }

    async fn find_all_for_user(
        &self,
        user_id: i64,
        bank_code: Option<&str>,
    ) -> Result<Vec<Account>, LedgerError> {
        let inner = self.inner.lock().await;
        let mut accounts: Vec<Account> = inner
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .filter(|a| bank_code.map_or(true, |code| a.bank_code == code))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(accounts)
    }

    async fn connected_account(&self, user_id: i64) -> Result<Option<Account>, LedgerError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .accounts
            .values()
            .find(|a| a.user_id == user_id && a.connected)
            .cloned())
    }

    async fn connect_account(
        &self,
        user_id: i64,
        account_id: i64,
    ) -> Result<Account, LedgerError> {
        let mut inner = self.inner.lock().await;

        match inner.accounts.get(&account_id) {
            Some(account) if account.user_id == user_id => {}
            Some(account) => {
                return Err(LedgerError::OwnershipMismatch(
                    account.account_number.clone(),
                ))
            }
            None => return Err(LedgerError::AccountNotFound(account_id.to_string())),
        }

        for account in inner.accounts.values_mut() {
            if account.user_id == user_id {
                account.connected = account.id == account_id;
            }
        }
        Ok(inner.accounts[&account_id].clone())
    }
}

#[async_trait]
impl TransactionRecorder for MemoryLedgerStore {
    async fn post_charge(&self, posting: ChargePosting) -> Result<PayHistory, LedgerError> {
        let mut inner = self.inner.lock().await;
        self.take_injected_failure()?;

        let balance_after = {
            let account = inner
                .accounts
                .get_mut(&posting.account_id)
                .ok_or_else(|| LedgerError::AccountNotFound(posting.account_id.to_string()))?;
            account.balance += posting.amount;
            account.balance
        };

        let id = inner.next_history_id();
        Ok(inner.append_history(PayHistory {
            id,
            account_id: posting.account_id,
            amount: posting.amount,
            balance_after,
            pay_type: PayType::Charge,
            counterparty_name: posting.counterparty_name,
            counterparty_number: posting.counterparty_number,
            description: posting.description,
            created_at: Utc::now(),
        }))
    }

    async fn post_transfer(&self, posting: TransferPosting) -> Result<TransferLegs, LedgerError> {
        let mut inner = self.inner.lock().await;
        self.take_injected_failure()?;

        // Funds check against current state, not the caller's snapshot.
        let sender_balance = inner
            .accounts
            .get(&posting.sender.id)
            .ok_or_else(|| LedgerError::AccountNotFound(posting.sender.account_number.clone()))?
            .balance;
        inner
            .accounts
            .get(&posting.target.id)
            .ok_or_else(|| LedgerError::AccountNotFound(posting.target.account_number.clone()))?;
        if sender_balance < posting.amount {
            return Err(LedgerError::InsufficientFunds {
                requested: posting.amount,
                available: sender_balance,
            });
        }

        let sender_after = {
            let sender = inner.accounts.get_mut(&posting.sender.id).unwrap();
            sender.balance -= posting.amount;
            sender.balance
        };
        let target_after = {
            let target = inner.accounts.get_mut(&posting.target.id).unwrap();
            target.balance += posting.amount;
            target.balance
        };

        let now = Utc::now();
        let out_id = inner.next_history_id();
        let outgoing = inner.append_history(PayHistory {
            id: out_id,
            account_id: posting.sender.id,
            amount: posting.amount,
            balance_after: sender_after,
            pay_type: PayType::TransferOut,
            counterparty_name: display_name(&posting.target),
            counterparty_number: posting.target.account_number.clone(),
            description: posting.description.clone(),
            created_at: now,
        });
        let in_id = inner.next_history_id();
        let incoming = inner.append_history(PayHistory {
            id: in_id,
            account_id: posting.target.id,
            amount: posting.amount,
            balance_after: target_after,
            pay_type: PayType::TransferIn,
            counterparty_name: display_name(&posting.sender),
            counterparty_number: posting.sender.account_number.clone(),
            description: posting.description,
            created_at: now,
        });

        Ok(TransferLegs { outgoing, incoming })
    }
}

#[async_trait]
impl HistoryReader for MemoryLedgerStore {
    async fn find_history(
        &self,
        account_id: i64,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<PaginatedHistory<PayHistory>, LedgerError> {
        let inner = self.inner.lock().await;
        let mut matching: Vec<PayHistory> = inner
            .history
            .iter()
            .filter(|h| h.account_id == account_id)
            .filter(|h| filter.from.map_or(true, |from| h.created_at >= from))
            .filter(|h| filter.until.map_or(true, |until| h.created_at < until))
            .filter(|h| filter.pay_type.map_or(true, |ty| h.pay_type == ty))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total_items = matching.len() as i64;
        let start = page.offset().min(total_items) as usize;
        let end = page.offset().saturating_add(page.size).min(total_items) as usize;
        let data = matching[start..end].to_vec();

        Ok(PaginatedHistory::new(data, page.page, total_items, page.size))
    }
}

fn display_name(account: &Account) -> String {
    bank::bank_name(&account.bank_code)
        .unwrap_or("Unknown")
        .to_string()
}
