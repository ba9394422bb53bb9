//! HTTP handlers, one module per resource.

pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod system;
pub mod users;

use axum::Json;
use common::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ApiError;

/// `page` and `limit` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn request(&self, default_limit: u32) -> PageRequest {
        PageRequest::from_query(self.page, self.limit, default_limit)
    }
}

/// Renders `{success: true, <key>: [...], pagination: {...}}`.
pub(crate) fn paged<T: Serialize>(key: &str, page: Page<T>) -> Result<Json<Value>, ApiError> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert(key.to_string(), to_value(&page.items)?);
    body.insert("pagination".to_string(), to_value(&page.pagination())?);
    Ok(Json(Value::Object(body)))
}

/// Renders `{success: true, message, <key>: value}`.
pub(crate) fn done<T: Serialize>(message: &str, key: &str, value: &T) -> Result<Json<Value>, ApiError> {
    let mut body = json!({ "success": true, "message": message });
    body[key] = to_value(value)?;
    Ok(Json(body))
}

/// Renders `{success: true, <key>: value}`.
pub(crate) fn found<T: Serialize>(key: &str, value: &T) -> Result<Json<Value>, ApiError> {
    let mut body = json!({ "success": true });
    body[key] = to_value(value)?;
    Ok(Json(body))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(format!("serialization failed: {e}")))
}
