pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::ports::LedgerStore;
use crate::services::{AccountService, HistoryService, LedgerService};

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub ledger: Arc<LedgerService>,
    pub history: Arc<HistoryService>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(store.clone())),
            ledger: Arc::new(LedgerService::new(store.clone())),
            history: Arc::new(HistoryService::new(store)),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/accounts",
            post(handlers::accounts::create_account).get(handlers::accounts::list_accounts),
        )
        .route(
            "/api/accounts/connect",
            post(handlers::accounts::connect_account),
        )
        .route(
            "/api/accounts/connected",
            get(handlers::accounts::connected_account),
        )
        .route(
            "/api/accounts/:account_number",
            get(handlers::accounts::get_account),
        )
        .route(
            "/api/accounts/id/:account_id",
            get(handlers::accounts::get_account_by_id),
        )
        .route("/api/pay/charge", post(handlers::pay::charge_balance))
        .route("/api/pay/transfer", post(handlers::pay::send_money))
        .route(
            "/api/pay/:account_number/history",
            get(handlers::pay::pay_history),
        )
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
