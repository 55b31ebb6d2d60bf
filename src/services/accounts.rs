//! Account lifecycle: creation, connection, lookups.

use std::sync::Arc;

use crate::domain::{bank, Account, NewAccount};
use crate::error::LedgerError;
use crate::ports::LedgerStore;

pub struct AccountService {
    store: Arc<dyn LedgerStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Creates a fresh account with a generated unique number and zero
    /// balance.
    pub async fn create_account(
        &self,
        user_id: i64,
        bank_code: &str,
    ) -> Result<Account, LedgerError> {
        if !bank::is_supported(bank_code) {
            return Err(LedgerError::InvalidBankCode(bank_code.to_string()));
        }

        let account = self
            .store
            .insert_account(NewAccount::generate(user_id, bank_code))
            .await?;
        tracing::info!(
            user_id,
            account_number = %account.account_number,
            bank_code,
            "account created"
        );
        Ok(account)
    }

    /// Links an existing account as the user's connected account, replacing
    /// any prior connection. The account must already belong to the user.
    pub async fn connect_account(
        &self,
        user_id: i64,
        account_number: &str,
    ) -> Result<Account, LedgerError> {
        let account = self.require_by_number(account_number).await?;
        if account.user_id != user_id {
            return Err(LedgerError::OwnershipMismatch(account_number.to_string()));
        }

        let connected = self.store.connect_account(user_id, account.id).await?;
        tracing::info!(user_id, account_number = %account_number, "account connected");
        Ok(connected)
    }

    pub async fn find_all_accounts(
        &self,
        user_id: i64,
        bank_code: Option<&str>,
    ) -> Result<Vec<Account>, LedgerError> {
        self.store.find_all_for_user(user_id, bank_code).await
    }

    pub async fn connected_account(&self, user_id: i64) -> Result<Account, LedgerError> {
        self.store
            .connected_account(user_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(format!("no connected account for user {user_id}")))
    }

    pub async fn find_by_account_number(
        &self,
        account_number: &str,
    ) -> Result<Account, LedgerError> {
        self.require_by_number(account_number).await
    }

    pub async fn find_by_account_id(&self, account_id: i64) -> Result<Account, LedgerError> {
        self.store
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    async fn require_by_number(&self, account_number: &str) -> Result<Account, LedgerError> {
        self.store
            .find_by_number(account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))
    }
}
