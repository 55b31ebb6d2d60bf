//! Postgres implementation of the ledger storage ports.
//!
//! Every balance mutation runs inside one sqlx transaction. Transfers lock
//! both account rows with `FOR UPDATE` in ascending id order, so concurrent
//! opposite-direction transfers between the same pair cannot deadlock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;
use crate::domain::{Account, NewAccount, PaginatedHistory, PayHistory, PayType};
use crate::error::LedgerError;
use crate::ports::{
    AccountStore, ChargePosting, HistoryFilter, HistoryReader, PageRequest, TransactionRecorder,
    TransferLegs, TransferPosting,
};

pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
}

/// Postgres-backed ledger store.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PostgresLedgerStore {
    async fn insert_account(&self, new: NewAccount) -> Result<Account, LedgerError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (account_number, user_id, bank_code, balance, connected, created_at)
            VALUES ($1, $2, $3, 0, FALSE, NOW())
            RETURNING id, account_number, user_id, bank_code, balance, connected, created_at
            "#,
        )
        .bind(&new.account_number)
        .bind(new.user_id)
        .bind(&new.bank_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_domain())
    }

    async fn find_by_number(&self, account_number: &str) -> Result<Option<Account>, LedgerError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE account_number = $1",
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccountRow::into_domain))
    }

    async fn find_by_id(&self, account_id: i64) -> Result<Option<Account>, LedgerError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(AccountRow::into_domain))
    }

    async fn find_all_for_user(
        &self,
        user_id: i64,
        bank_code: Option<&str>,
    ) -> Result<Vec<Account>, LedgerError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT * FROM accounts
            WHERE user_id = $1
              AND ($2::text IS NULL OR bank_code = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(bank_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AccountRow::into_domain).collect())
    }

    async fn connected_account(&self, user_id: i64) -> Result<Option<Account>, LedgerError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE user_id = $1 AND connected",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccountRow::into_domain))
    }

    async fn connect_account(
        &self,
        user_id: i64,
        account_id: i64,
    ) -> Result<Account, LedgerError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE accounts SET connected = FALSE WHERE user_id = $1 AND connected")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts SET connected = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING id, account_number, user_id, bank_code, balance, connected, created_at
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let account = match row {
            Some(row) => row.into_domain(),
            None => {
                // Distinguish a foreign owner from a missing row.
                let other = sqlx::query_as::<_, AccountRow>(
                    "SELECT * FROM accounts WHERE id = $1",
                )
                .bind(account_id)
                .fetch_optional(&mut *tx)
                .await?;
                tx.rollback().await?;
                return Err(match other {
                    Some(row) => LedgerError::OwnershipMismatch(row.account_number),
                    None => LedgerError::AccountNotFound(account_id.to_string()),
                });
            }
        };

        tx.commit().await?;
        Ok(account)
    }
}

#[async_trait]
impl TransactionRecorder for PostgresLedgerStore {
    async fn post_charge(&self, posting: ChargePosting) -> Result<PayHistory, LedgerError> {
        let mut tx = self.pool.begin().await?;

        // Row-level lock via the UPDATE itself; no separate SELECT needed.
        let balance_after = sqlx::query_scalar::<_, i64>(
            "UPDATE accounts SET balance = balance + $1 WHERE id = $2 RETURNING balance",
        )
        .bind(posting.amount)
        .bind(posting.account_id)
        .fetch_optional(&mut *tx)
        .await?;

        let balance_after = match balance_after {
            Some(balance) => balance,
            None => {
                tx.rollback().await?;
                return Err(LedgerError::AccountNotFound(posting.account_id.to_string()));
            }
        };

        let record = insert_history(
            &mut tx,
            HistoryInsert {
                account_id: posting.account_id,
                amount: posting.amount,
                balance_after,
                pay_type: PayType::Charge,
                counterparty_name: &posting.counterparty_name,
                counterparty_number: &posting.counterparty_number,
                description: &posting.description,
                created_at: Utc::now(),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn post_transfer(&self, posting: TransferPosting) -> Result<TransferLegs, LedgerError> {
        let sender = &posting.sender;
        let target = &posting.target;
        let mut tx = self.pool.begin().await?;

        // Canonical lock order: ascending account id.
        let locked = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(vec![sender.id, target.id])
        .fetch_all(&mut *tx)
        .await?;

        if locked.len() != 2 {
            tx.rollback().await?;
            return Err(LedgerError::AccountNotFound(sender.account_number.clone()));
        }

        // Funds check against the locked balance, not the caller's snapshot.
        let sender_balance = locked
            .iter()
            .find(|row| row.id == sender.id)
            .map(|row| row.balance)
            .unwrap_or(0);
        if sender_balance < posting.amount {
            tx.rollback().await?;
            return Err(LedgerError::InsufficientFunds {
                requested: posting.amount,
                available: sender_balance,
            });
        }

        let sender_after = sqlx::query_scalar::<_, i64>(
            "UPDATE accounts SET balance = balance - $1 WHERE id = $2 RETURNING balance",
        )
        .bind(posting.amount)
        .bind(sender.id)
        .fetch_one(&mut *tx)
        .await?;

        let target_after = sqlx::query_scalar::<_, i64>(
            "UPDATE accounts SET balance = balance + $1 WHERE id = $2 RETURNING balance",
        )
        .bind(posting.amount)
        .bind(target.id)
        .fetch_one(&mut *tx)
        .await?;

        // Both legs share one timestamp.
        let now = Utc::now();
        let outgoing = insert_history(
            &mut tx,
            HistoryInsert {
                account_id: sender.id,
                amount: posting.amount,
                balance_after: sender_after,
                pay_type: PayType::TransferOut,
                counterparty_name: counterparty_name(target),
                counterparty_number: &target.account_number,
                description: &posting.description,
                created_at: now,
            },
        )
        .await?;
        let incoming = insert_history(
            &mut tx,
            HistoryInsert {
                account_id: target.id,
                amount: posting.amount,
                balance_after: target_after,
                pay_type: PayType::TransferIn,
                counterparty_name: counterparty_name(sender),
                counterparty_number: &sender.account_number,
                description: &posting.description,
                created_at: now,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(TransferLegs { outgoing, incoming })
    }
}

#[async_trait]
impl HistoryReader for PostgresLedgerStore {
    async fn find_history(
        &self,
        account_id: i64,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<PaginatedHistory<PayHistory>, LedgerError> {
        let pay_type = filter.pay_type.map(|t| t.as_str());

        // Count and page must come from one snapshot, or a concurrent
        // posting could make total_items disagree with the returned rows.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let total_items = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM pay_history
            WHERE account_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
              AND ($4::text IS NULL OR pay_type = $4)
            "#,
        )
        .bind(account_id)
        .bind(filter.from)
        .bind(filter.until)
        .bind(pay_type)
        .fetch_one(&mut *tx)
        .await?;

        let rows = sqlx::query_as::<_, PayHistoryRow>(
            r#"
            SELECT * FROM pay_history
            WHERE account_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
              AND ($4::text IS NULL OR pay_type = $4)
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(account_id)
        .bind(filter.from)
        .bind(filter.until)
        .bind(pay_type)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let data = rows
            .into_iter()
            .map(PayHistoryRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedHistory::new(data, page.page, total_items, page.size))
    }
}

fn counterparty_name(account: &Account) -> &str {
    crate::domain::bank::bank_name(&account.bank_code).unwrap_or("Unknown")
}

struct HistoryInsert<'a> {
    account_id: i64,
    amount: i64,
    balance_after: i64,
    pay_type: PayType,
    counterparty_name: &'a str,
    counterparty_number: &'a str,
    description: &'a str,
    created_at: DateTime<Utc>,
}

async fn insert_history(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    entry: HistoryInsert<'_>,
) -> Result<PayHistory, LedgerError> {
    let row = sqlx::query_as::<_, PayHistoryRow>(
        r#"
        INSERT INTO pay_history (
            account_id, amount, balance_after, pay_type,
            counterparty_name, counterparty_number, description, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, account_id, amount, balance_after, pay_type,
            counterparty_name, counterparty_number, description, created_at
        "#,
    )
    .bind(entry.account_id)
    .bind(entry.amount)
    .bind(entry.balance_after)
    .bind(entry.pay_type.as_str())
    .bind(entry.counterparty_name)
    .bind(entry.counterparty_number)
    .bind(entry.description)
    .bind(entry.created_at)
    .fetch_one(&mut **tx)
    .await?;

    row.into_domain()
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    account_number: String,
    user_id: i64,
    bank_code: String,
    balance: i64,
    connected: bool,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_domain(self) -> Account {
        Account {
            id: self.id,
            account_number: self.account_number,
            user_id: self.user_id,
            bank_code: self.bank_code,
            balance: self.balance,
            connected: self.connected,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PayHistoryRow {
    id: i64,
    account_id: i64,
    amount: i64,
    balance_after: i64,
    pay_type: String,
    counterparty_name: String,
    counterparty_number: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl PayHistoryRow {
    fn into_domain(self) -> Result<PayHistory, LedgerError> {
        let pay_type = self
            .pay_type
            .parse::<PayType>()
            .map_err(LedgerError::StorageUnavailable)?;

        Ok(PayHistory {
            id: self.id,
            account_id: self.account_id,
            amount: self.amount,
            balance_after: self.balance_after,
            pay_type,
            counterparty_name: self.counterparty_name,
            counterparty_number: self.counterparty_number,
            description: self.description,
            created_at: self.created_at,
        })
    }
}
