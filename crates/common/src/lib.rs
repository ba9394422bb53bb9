//! Shared types for the storefront workspace.
//!
//! Identifiers, money amounts, order/payment enumerations and pagination
//! are used by every other crate, so they live here with no dependency on
//! storage or HTTP.

pub mod money;
pub mod pagination;
pub mod status;
pub mod types;

pub use money::{AmountOverflow, Money};
pub use pagination::{MAX_PAGE_SIZE, Page, PageRequest, Pagination};
pub use status::{
    OrderStatus, ParseEnumError, PaymentMethod, PaymentStatus, ProductCondition, UserRole,
};
pub use types::{CartId, CategoryId, OrderId, ProductId, UserId};

pub use rust_decimal::Decimal;
