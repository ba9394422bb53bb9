//! Cart endpoints. Every route acts on the caller's own cart.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::ProductId;
use serde::Deserialize;
use serde_json::Value;
use store::{Store, VariantSelection};

use super::{done, found};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<VariantSelection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<VariantSelection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant: Option<VariantSelection>,
}

/// GET /cart
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let cart = state.cart.get(user.id).await?;
    found("cart", &cart)
}

/// GET /cart/summary
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn summary<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let summary = state.cart.summary(user.id).await?;
    found("summary", &summary)
}

/// POST /cart/add
#[tracing::instrument(skip_all, fields(user = %user.id, product = %req.product_id))]
pub async fn add<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<AddItemRequest>,
) -> Result<Json<Value>, ApiError> {
    let cart = state
        .cart
        .add(user.id, req.product_id, req.quantity, req.variant)
        .await?;
    done("Item added to cart", "cart", &cart)
}

/// PUT /cart/update
#[tracing::instrument(skip_all, fields(user = %user.id, product = %req.product_id))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<UpdateItemRequest>,
) -> Result<Json<Value>, ApiError> {
    let cart = state
        .cart
        .set_quantity(user.id, req.product_id, req.quantity, req.variant)
        .await?;
    done("Cart updated", "cart", &cart)
}

/// DELETE /cart/remove
#[tracing::instrument(skip_all, fields(user = %user.id, product = %req.product_id))]
pub async fn remove<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<RemoveItemRequest>,
) -> Result<Json<Value>, ApiError> {
    let cart = state
        .cart
        .remove(user.id, req.product_id, req.variant)
        .await?;
    done("Item removed from cart", "cart", &cart)
}

/// DELETE /cart/clear
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn clear<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let cart = state.cart.clear(user.id).await?;
    done("Cart cleared", "cart", &cart)
}
