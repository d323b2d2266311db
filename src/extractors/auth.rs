//! Extract the authenticated caller from the `Authorization` header.

use crate::auth::Claims;
use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// Verified token claims of the caller. The `Bearer ` prefix is optional.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

/// Token text from an `Authorization` header value, without any `Bearer ` prefix.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("authorization header is required".into()))?;
        let token = bearer_token(header)
            .ok_or_else(|| AppError::Unauthorized("authorization header is required".into()))?;
        let claims = state.tokens.verify(token)?;
        Ok(AuthUser(claims))
    }
}
