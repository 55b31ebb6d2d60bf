use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Every fallible operation in the ledger core surfaces exactly one of
/// these kinds. Validation kinds are raised before any mutation; storage
/// kinds mean the atomic unit was fully rolled back.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: i64, available: i64 },

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("transfers to the same account are not allowed")]
    SelfTransferNotAllowed,

    #[error("account {0} belongs to a different user")]
    OwnershipMismatch(String),

    #[error("unknown bank code: {0}")]
    InvalidBankCode(String),

    #[error("invalid page request: page {page}, size {size}")]
    InvalidPageRequest { page: i64, size: i64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("storage unavailable: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::InvalidAmount(_)
            | LedgerError::InvalidBankCode(_)
            | LedgerError::InvalidPageRequest { .. } => StatusCode::BAD_REQUEST,
            LedgerError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::AccountNotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::SelfTransferNotAllowed | LedgerError::OwnershipMismatch(_) => {
                StatusCode::CONFLICT
            }
            LedgerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LedgerError::Storage(_) | LedgerError::StorageUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
