//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use checkout::CheckoutRequest;
use common::{OrderId, OrderStatus, PageRequest};
use serde::Deserialize;
use serde_json::Value;
use store::Store;

use super::{done, found, paged};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 10;

/// Query parameters for order listings.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub order_status: OrderStatus,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// POST /orders
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let order = state.checkout.checkout(user.id, req).await?;
    Ok((
        StatusCode::CREATED,
        done("Order created successfully", "order", &order)?,
    ))
}

/// GET /orders
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiQuery(params): ApiQuery<OrderListParams>,
) -> Result<Json<Value>, ApiError> {
    let page = PageRequest::from_query(params.page, params.limit, DEFAULT_LIMIT);
    let orders = state
        .orders
        .list_for_user(user.id, page, params.status)
        .await?;
    paged("orders", orders)
}

/// GET /orders/seller/all: orders containing at least one of the caller's products.
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn list_for_seller<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiQuery(params): ApiQuery<OrderListParams>,
) -> Result<Json<Value>, ApiError> {
    let page = PageRequest::from_query(params.page, params.limit, DEFAULT_LIMIT);
    let orders = state
        .orders
        .list_for_seller(user.id, page, params.status)
        .await?;
    paged("orders", orders)
}

/// GET /orders/{id}
#[tracing::instrument(skip_all, fields(user = %user.id, order_id = %id))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Value>, ApiError> {
    let order = state.orders.get(id, &user).await?;
    found("order", &order)
}

/// PUT /orders/{id}/status
#[tracing::instrument(skip_all, fields(user = %user.id, order_id = %id, status = %req.order_status))]
pub async fn update_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(req): ApiJson<StatusUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let order = state
        .lifecycle
        .update_status(id, &user, req.order_status, req.tracking_number)
        .await?;
    done("Order status updated", "order", &order)
}

/// PUT /orders/{id}/cancel
#[tracing::instrument(skip_all, fields(user = %user.id, order_id = %id))]
pub async fn cancel<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Value>, ApiError> {
    let order = state.lifecycle.cancel(id, &user).await?;
    done("Order cancelled successfully", "order", &order)
}
