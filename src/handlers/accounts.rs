use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::LedgerError;
use crate::handlers::auth::AuthUser;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub bank_code: String,
}

#[derive(Deserialize)]
pub struct ConnectAccountRequest {
    pub account_number: String,
}

#[derive(Deserialize)]
pub struct AccountsQuery {
    pub bank_code: Option<String>,
}

pub async fn create_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let account = state.accounts.create_account(user_id, &req.bank_code).await?;
    Ok(Json(account))
}

pub async fn connect_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<ConnectAccountRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let account = state
        .accounts
        .connect_account(user_id, &req.account_number)
        .await?;
    Ok(Json(account))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<AccountsQuery>,
) -> Result<impl IntoResponse, LedgerError> {
    let accounts = state
        .accounts
        .find_all_accounts(user_id, query.bank_code.as_deref())
        .await?;
    Ok(Json(accounts))
}

pub async fn connected_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, LedgerError> {
    let account = state.accounts.connected_account(user_id).await?;
    Ok(Json(account))
}

pub async fn get_account(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(account_number): Path<String>,
) -> Result<impl IntoResponse, LedgerError> {
    let account = state
        .accounts
        .find_by_account_number(&account_number)
        .await?;
    Ok(Json(account))
}

pub async fn get_account_by_id(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(account_id): Path<i64>,
) -> Result<impl IntoResponse, LedgerError> {
    let account = state.accounts.find_by_account_id(account_id).await?;
    Ok(Json(account))
}
