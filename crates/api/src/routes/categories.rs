//! Category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::NewCategory;
use serde_json::Value;
use store::Store;

use super::{done, found};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// GET /categories
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    let categories = state.catalog.list_categories().await?;
    found("categories", &categories)
}

/// POST /categories (admin only)
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewCategory>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let category = state.catalog.create_category(&user, input).await?;
    Ok((
        StatusCode::CREATED,
        done("Category created successfully", "category", &category)?,
    ))
}
