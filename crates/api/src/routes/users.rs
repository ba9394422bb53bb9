//! Profile endpoints for the calling user.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;
use store::{Profile, Store};

use super::{done, found};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub profile: Profile,
}

/// GET /users/profile
pub async fn profile<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.profile(user.id).await?;
    found("user", &user)
}

/// PUT /users/profile
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn update_profile<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<ProfileUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state.users.update_profile(user.id, req.profile).await?;
    done("Profile updated successfully", "user", &user)
}
