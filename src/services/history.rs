//! Paginated, filterable queries over recorded history. Read-only.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::domain::{PaginatedHistory, PayHistory, PayType};
use crate::error::LedgerError;
use crate::ports::{HistoryFilter, LedgerStore, PageRequest};

pub struct HistoryService {
    store: Arc<dyn LedgerStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Newest-first page of an account's history. Date bounds are calendar
    /// days, both inclusive; `page` is 1-indexed. No matches is an empty
    /// page, not an error.
    pub async fn find_pay_history(
        &self,
        account_number: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        pay_type: Option<PayType>,
        page: i64,
        size: i64,
    ) -> Result<PaginatedHistory<PayHistory>, LedgerError> {
        if page < 1 || size < 1 {
            return Err(LedgerError::InvalidPageRequest { page, size });
        }
        let account = self
            .store
            .find_by_number(account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;

        let filter = HistoryFilter {
            from: start_date.map(day_start),
            // Inclusive end date becomes an exclusive bound at the next midnight.
            until: end_date.and_then(|d| d.succ_opt()).map(day_start),
            pay_type,
        };

        self.store
            .find_history(account.id, &filter, PageRequest { page, size })
            .await
    }
}

fn day_start(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
