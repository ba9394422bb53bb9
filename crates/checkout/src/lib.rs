//! Checkout and order lifecycle for the storefront.
//!
//! Checkout runs as a saga with compensating actions:
//! 1. Check every requested line against the catalog
//! 2. Reserve stock line by line with a guarded decrement
//! 3. Price the order and insert it (the commit point)
//! 4. Empty the shopper's cart
//!
//! If a step before the commit point fails, the stock reserved so far is
//! restored in reverse order. Cancelling an order later flips its status
//! with a compare-and-set and only then returns the stock.

pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod request;

pub use coordinator::CheckoutCoordinator;
pub use error::{CheckoutError, CompensationReport};
pub use lifecycle::OrderLifecycle;
pub use policy::CheckoutPolicy;
pub use request::{CheckoutItem, CheckoutRequest};
