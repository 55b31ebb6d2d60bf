//! Authenticated-user extractor.
//!
//! Identity verification happens upstream (gateway / auth collaborator);
//! the core trusts the `x-user-id` header it forwards.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = LedgerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| LedgerError::Unauthorized("missing x-user-id header".to_string()))?;

        raw.parse::<i64>()
            .map(AuthUser)
            .map_err(|_| LedgerError::Unauthorized("invalid x-user-id header".to_string()))
    }
}
