//! Business rules for the storefront.
//!
//! This crate provides:
//! - CatalogService for listings, product management and categories
//! - CartService for the per-user shopping cart
//! - OrderService for reading orders with access checks
//! - UserService for the caller's profile
//! - PricingPolicy and order-number generation used at checkout

pub mod cart;
pub mod catalog;
pub mod error;
pub mod order_number;
pub mod orders;
pub mod pricing;
pub mod users;

#[cfg(test)]
mod testing;

pub use cart::{CartLineView, CartService, CartView};
pub use catalog::{CatalogService, NewCategory, NewProduct, ProductUpdate, slugify};
pub use error::{DomainError, Result};
pub use orders::OrderService;
pub use pricing::{OrderTotals, PricingPolicy};
pub use users::UserService;
