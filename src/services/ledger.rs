//! Ledger engine: the only code path that mutates balances.
//!
//! Each operation validates its inputs before anything is touched, then
//! hands the storage adapter one atomic posting. A posting either commits
//! every effect (balance writes plus history appends) or none of them.

use std::sync::Arc;

use crate::domain::{bank, Account, PayHistory};
use crate::error::LedgerError;
use crate::ports::{ChargePosting, LedgerStore, TransferPosting};

const CHARGE_DESCRIPTION: &str = "balance charge";

pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Credits `amount` to the account and returns the CHARGE record carrying
    /// the post-charge balance.
    pub async fn charge_balance(
        &self,
        account_number: &str,
        amount: i64,
    ) -> Result<PayHistory, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let account = self.resolve(account_number).await?;

        let record = self
            .store
            .post_charge(ChargePosting {
                account_id: account.id,
                amount,
                counterparty_name: bank::bank_name(&account.bank_code)
                    .unwrap_or("Unknown")
                    .to_string(),
                counterparty_number: account.account_number.clone(),
                description: CHARGE_DESCRIPTION.to_string(),
            })
            .await?;

        tracing::info!(
            account_number = %account_number,
            amount,
            balance_after = record.balance_after,
            "balance charged"
        );
        Ok(record)
    }

    /// Moves `amount` from sender to target and returns the sender-side
    /// TRANSFER_OUT record. The funds check runs inside the posting, under
    /// the account locks, so a stale snapshot cannot overdraw.
    pub async fn send_money(
        &self,
        sender_account_number: &str,
        info: &str,
        target_account_number: &str,
        amount: i64,
    ) -> Result<PayHistory, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let sender = self.resolve(sender_account_number).await?;
        let target = self.resolve(target_account_number).await?;
        if sender.id == target.id {
            return Err(LedgerError::SelfTransferNotAllowed);
        }

        let legs = self
            .store
            .post_transfer(TransferPosting {
                sender,
                target,
                amount,
                description: info.to_string(),
            })
            .await?;

        tracing::info!(
            sender = %sender_account_number,
            target = %target_account_number,
            amount,
            "transfer committed"
        );
        Ok(legs.outgoing)
    }

    async fn resolve(&self, account_number: &str) -> Result<Account, LedgerError> {
        self.store
            .find_by_number(account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))
    }
}
