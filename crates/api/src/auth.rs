//! Bearer-token authentication.
//!
//! Tokens are opaque strings mapped to users by the store. Issuing them is
//! out of scope; `ADMIN_TOKEN` provisions one admin at startup.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use store::{Store, User};

use crate::error::ApiError;
use crate::state::AppState;

/// The active user behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<Arc<AppState<S>>> for AuthUser
where
    S: Store + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Err(ApiError::Unauthorized(
                "Missing or invalid Authorization header".to_string(),
            ));
        };

        match state.store.user_for_token(token).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                metrics::counter!("auth_rejected_total").increment(1);
                Err(ApiError::Unauthorized("Invalid API token".to_string()))
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');

    let scheme = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}
