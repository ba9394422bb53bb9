//! Domain error types.

use common::{AmountOverflow, ProductId};
use store::{Product, StoreError};
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The record does not exist or is not visible.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Not enough stock to satisfy the requested quantity.
    #[error("Not enough stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductId,
        name: String,
        requested: u32,
        available: u32,
    },

    /// The request is malformed.
    #[error("{0}")]
    InvalidArgument(String),

    /// The caller may not perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// The record is in a state that does not allow the operation.
    #[error("{0}")]
    InvalidState(String),

    /// An unexpected storage failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn insufficient_stock(product: &Product, requested: u32) -> Self {
        DomainError::InsufficientStock {
            product: product.id,
            name: product.name.clone(),
            requested,
            available: product.stock,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::InvalidArgument(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotFound { .. } => "not_found",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::InvalidArgument(_) => "invalid_argument",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::Store(_) => "store",
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            StoreError::InsufficientStock {
                product,
                requested,
                available,
            } => DomainError::InsufficientStock {
                product,
                name: product.to_string(),
                requested,
                available,
            },
            StoreError::StatusConflict { order, current } => {
                DomainError::InvalidState(format!("Order {order} is already {current}"))
            }
            StoreError::Conflict(message) => DomainError::InvalidArgument(message),
            other => DomainError::Store(other),
        }
    }
}

impl From<AmountOverflow> for DomainError {
    fn from(_: AmountOverflow) -> Self {
        DomainError::InvalidArgument("Amount is too large".to_string())
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, OrderStatus};

    #[test]
    fn test_store_not_found_keeps_entity() {
        let err: DomainError = StoreError::not_found("Product", "abc").into();
        assert!(matches!(err, DomainError::NotFound { entity: "Product", .. }));
        assert_eq!(err.to_string(), "Product not found: abc");
    }

    #[test]
    fn test_status_conflict_becomes_invalid_state() {
        let err: DomainError = StoreError::StatusConflict {
            order: OrderId::new(),
            current: OrderStatus::Shipped,
        }
        .into();
        assert_eq!(err.kind(), "invalid_state");
        assert!(err.to_string().ends_with("is already shipped"));
    }

    #[test]
    fn test_unique_violation_is_a_client_error() {
        let err: DomainError = StoreError::Conflict("duplicate slug".to_string()).into();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }
}
