//! Persistence for the storefront: catalog, carts, orders and users.
//!
//! Two backends implement the same traits: [`InMemoryStore`] for tests and
//! database-less runs, and [`PostgresStore`] backed by sqlx.

pub mod cart;
pub mod category;
pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod product;
pub mod query;
pub mod store;
pub mod user;

pub use cart::{Cart, CartItem, CartSummary};
pub use category::Category;
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use order::{Order, OrderItem, ShippingAddress, StatusChange};
pub use postgres::PostgresStore;
pub use product::{
    Dimensions, Product, ProductSummary, ProductVariant, Rating, ShippingInfo, VariantSelection,
};
pub use query::{OrderQuery, ProductQuery, SortField, SortOrder};
pub use store::{CartStore, CategoryStore, OrderStore, ProductStore, Store, StoreExt, UserStore};
pub use user::{Profile, ProfileAddress, User};
