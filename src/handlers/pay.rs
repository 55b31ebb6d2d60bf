use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::PayType;
use crate::error::LedgerError;
use crate::handlers::auth::AuthUser;
use crate::AppState;

#[derive(Deserialize)]
pub struct ChargeRequest {
    pub account_number: String,
    pub amount: i64,
}

#[derive(Deserialize)]
pub struct TransferRequest {
    pub sender_account_number: String,
    pub target_account_number: String,
    pub amount: i64,
    #[serde(default)]
    pub info: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub pay_type: Option<PayType>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

pub async fn charge_balance(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(req): Json<ChargeRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let record = state
        .ledger
        .charge_balance(&req.account_number, req.amount)
        .await?;
    Ok(Json(record))
}

pub async fn send_money(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(req): Json<TransferRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let record = state
        .ledger
        .send_money(
            &req.sender_account_number,
            &req.info,
            &req.target_account_number,
            req.amount,
        )
        .await?;
    Ok(Json(record))
}

pub async fn pay_history(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(account_number): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, LedgerError> {
    let page = state
        .history
        .find_pay_history(
            &account_number,
            query.start_date,
            query.end_date,
            query.pay_type,
            query.page.unwrap_or(1),
            query.size.unwrap_or(20),
        )
        .await?;
    Ok(Json(page))
}
