//! Product endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{CategoryId, Decimal, Money, PageRequest, ProductCondition, ProductId, UserId};
use domain::{NewProduct, ProductUpdate};
use serde::Deserialize;
use serde_json::{Value, json};
use store::{ProductQuery, SortField, SortOrder, Store};

use super::{PageParams, done, found, paged};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 20;

/// Filters accepted by `GET /products`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<CategoryId>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub condition: Option<ProductCondition>,
    pub brand: Option<String>,
    pub free_shipping: Option<bool>,
}

impl ProductListParams {
    fn into_query(self) -> Result<ProductQuery, ApiError> {
        let sort = match self.sort_by.as_deref() {
            None => SortField::default(),
            Some(raw) => SortField::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown sort field: {raw}")))?,
        };
        let order = match self.sort_order.as_deref() {
            None => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown sort order: {raw}")))?,
        };

        let mut query = ProductQuery::new()
            .sort_by(sort, order)
            .page(PageRequest::from_query(self.page, self.limit, DEFAULT_LIMIT));

        if let Some(category) = self.category {
            query = query.category(category);
        }
        if let Some(raw) = self.min_price {
            query = query.min_price(parse_price("minPrice", &raw)?);
        }
        if let Some(raw) = self.max_price {
            query = query.max_price(parse_price("maxPrice", &raw)?);
        }
        if let Some(text) = self.search {
            query = query.search(&text);
        }
        if let Some(condition) = self.condition {
            query = query.condition(condition);
        }
        if let Some(brand) = self.brand.filter(|b| !b.trim().is_empty()) {
            query = query.brand(brand);
        }
        if let Some(free_shipping) = self.free_shipping {
            query = query.free_shipping(free_shipping);
        }
        Ok(query)
    }
}

fn parse_price(field: &str, raw: &str) -> Result<Money, ApiError> {
    Decimal::from_str(raw.trim())
        .map(Money::new)
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a number")))
}

/// GET /products
#[tracing::instrument(skip_all)]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(params): ApiQuery<ProductListParams>,
) -> Result<Json<Value>, ApiError> {
    let products = state.catalog.list_products(params.into_query()?).await?;
    paged("products", products)
}

/// GET /products/featured/all
pub async fn featured<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Value>, ApiError> {
    let products = state.catalog.featured_products().await?;
    found("products", &products)
}

/// GET /products/seller/{sellerId}
#[tracing::instrument(skip_all, fields(seller = %seller))]
pub async fn by_seller<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(seller): ApiPath<UserId>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let products = state
        .catalog
        .seller_products(seller, params.request(DEFAULT_LIMIT))
        .await?;
    paged("products", products)
}

/// GET /products/{id}
#[tracing::instrument(skip_all, fields(product_id = %id))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Value>, ApiError> {
    let product = state.catalog.get_product(id).await?;
    found("product", &product)
}

/// POST /products
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let product = state.catalog.create_product(&user, input).await?;
    Ok((
        StatusCode::CREATED,
        done("Product created successfully", "product", &product)?,
    ))
}

/// PUT /products/{id}
#[tracing::instrument(skip_all, fields(user = %user.id, product_id = %id))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> Result<Json<Value>, ApiError> {
    let product = state.catalog.update_product(&user, id, update).await?;
    done("Product updated successfully", "product", &product)
}

/// DELETE /products/{id}: soft delete.
#[tracing::instrument(skip_all, fields(user = %user.id, product_id = %id))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Value>, ApiError> {
    state.catalog.delete_product(&user, id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Product deleted successfully",
    })))
}
