use async_trait::async_trait;
use common::{CategoryId, OrderId, OrderStatus, Page, ProductId, UserId};

use crate::{
    Cart, Category, Order, OrderQuery, Product, ProductQuery, Result, StatusChange, StoreError,
    User,
};

/// Persistence for catalog products.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(&self, product: Product) -> Result<Product>;

    /// Returns the product whether or not it is active.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Returns the products that exist among `ids`, in no particular order.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Replaces the editable fields of a product.
    ///
    /// `stock`, `sold`, `view_count`, `seller` and `created_at` are kept from
    /// the stored record, so a stale copy never overwrites a concurrent
    /// reservation. Fails with `NotFound` if the product does not exist.
    async fn update_product(&self, product: Product) -> Result<Product>;

    /// Sets the stock level in a single write, leaving `sold` alone.
    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product>;

    /// Lists active products matching the query.
    async fn query_products(&self, query: ProductQuery) -> Result<Page<Product>>;

    async fn increment_view_count(&self, id: ProductId) -> Result<()>;

    /// Atomically applies `stock -= quantity; sold += quantity`.
    ///
    /// The decrement only happens if the product exists, is active and has at
    /// least `quantity` in stock, checked in the same write. Fails with
    /// `NotFound` or `InsufficientStock` otherwise. Returns the updated product.
    async fn reserve_stock(&self, id: ProductId, quantity: u32) -> Result<Product>;

    /// Atomically applies `stock += quantity; sold = max(sold - quantity, 0)`.
    ///
    /// Applies to inactive products too. Returns false if the product is gone.
    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<bool>;
}

/// Persistence for the category tree.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Fails with `Conflict` if the name or slug is taken.
    async fn insert_category(&self, category: Category) -> Result<Category>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Active categories ordered by `sort_order`, then name.
    async fn list_categories(&self) -> Result<Vec<Category>>;
}

/// Persistence for carts. Each user has at most one.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart(&self, user: UserId) -> Result<Option<Cart>>;

    /// Inserts or replaces the cart keyed by its user.
    ///
    /// Returns the stored cart, which keeps the id of any cart already stored
    /// for that user.
    async fn save_cart(&self, cart: Cart) -> Result<Cart>;
}

/// Persistence for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fails with `Conflict` if the order number is taken.
    async fn insert_order(&self, order: Order) -> Result<Order>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists matching orders, newest first.
    async fn query_orders(&self, query: OrderQuery) -> Result<Page<Order>>;

    /// Compare-and-set status update.
    ///
    /// Applies `change` only if the current status is one of `allowed_from`,
    /// checked in the same write. Fails with `StatusConflict` carrying the
    /// current status otherwise, or `NotFound` if the order does not exist.
    async fn update_status(
        &self,
        id: OrderId,
        change: &StatusChange,
        allowed_from: &[OrderStatus],
    ) -> Result<Order>;
}

/// Persistence for accounts and their bearer tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` if the username or email is taken.
    async fn insert_user(&self, user: User) -> Result<User>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Replaces the profile and timestamps of a stored user.
    async fn update_user(&self, user: User) -> Result<User>;

    /// Associates a bearer token with a user, replacing any previous owner.
    async fn insert_token(&self, token: &str, user: UserId) -> Result<()>;

    /// Resolves a bearer token to its active user.
    async fn user_for_token(&self, token: &str) -> Result<Option<User>>;
}

/// Everything the storefront persists.
pub trait Store: ProductStore + CategoryStore + CartStore + OrderStore + UserStore {}

impl<T> Store for T where T: ProductStore + CategoryStore + CartStore + OrderStore + UserStore {}

/// Extension trait providing lookups that fail when the record is absent.
#[async_trait]
pub trait StoreExt: Store {
    async fn require_product(&self, id: ProductId) -> Result<Product> {
        self.get_product(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Product", id))
    }

    async fn require_order(&self, id: OrderId) -> Result<Order> {
        self.get_order(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Order", id))
    }

    async fn require_user(&self, id: UserId) -> Result<User> {
        self.get_user(id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", id))
    }

    /// Returns the user's cart, creating and storing an empty one if needed.
    async fn ensure_cart(&self, user: UserId) -> Result<Cart> {
        match self.get_cart(user).await? {
            Some(cart) => Ok(cart),
            None => self.save_cart(Cart::empty(user)).await,
        }
    }
}

// Blanket implementation for all Store implementations
impl<T: Store + ?Sized> StoreExt for T {}
