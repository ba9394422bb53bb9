use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CategoryId, OrderId, OrderStatus, Page, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    Cart, CartStore, Category, CategoryStore, Order, OrderQuery, OrderStore, Product,
    ProductQuery, ProductStore, Result, StatusChange, StoreError, User, UserStore,
};

/// In-memory store implementation for tests and database-less runs.
///
/// Every conditional update runs under the table's write lock, which gives the
/// same all-or-nothing behaviour as the guarded SQL statements.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    categories: Arc<RwLock<HashMap<CategoryId, Category>>>,
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    users: Arc<RwLock<HashMap<UserId, User>>>,
    tokens: Arc<RwLock<HashMap<String, UserId>>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert_product(&self, product: Product) -> Result<Product> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn update_product(&self, mut product: Product) -> Result<Product> {
        let mut products = self.products.write().await;
        let stored = products
            .get_mut(&product.id)
            .ok_or_else(|| StoreError::not_found("Product", product.id))?;

        product.stock = stored.stock;
        product.sold = stored.sold;
        product.view_count = stored.view_count;
        product.seller = stored.seller;
        product.created_at = stored.created_at;
        product.updated_at = Utc::now();
        *stored = product.clone();
        Ok(product)
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product.stock = stock;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn query_products(&self, query: ProductQuery) -> Result<Page<Product>> {
        let products = self.products.read().await;
        let mut matching: Vec<_> = products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.compare(a, b).then_with(|| a.id.cmp(&b.id)));
        Ok(Page::from_sorted(matching, query.page))
    }

    async fn increment_view_count(&self, id: ProductId) -> Result<()> {
        if let Some(product) = self.products.write().await.get_mut(&id) {
            product.view_count += 1;
        }
        Ok(())
    }

    async fn reserve_stock(&self, id: ProductId, quantity: u32) -> Result<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .filter(|p| p.is_active)
            .ok_or_else(|| StoreError::not_found("Product", id))?;

        if product.stock < quantity {
            return Err(StoreError::InsufficientStock {
                product: id,
                requested: quantity,
                available: product.stock,
            });
        }

        product.stock -= quantity;
        product.sold += quantity;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<bool> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(false);
        };
        product.stock += quantity;
        product.sold = product.sold.saturating_sub(quantity);
        product.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl CategoryStore for InMemoryStore {
    async fn insert_category(&self, category: Category) -> Result<Category> {
        let mut categories = self.categories.write().await;
        if categories
            .values()
            .any(|c| c.name == category.name || c.slug == category.slug)
        {
            return Err(StoreError::Conflict(format!(
                "category {} already exists",
                category.name
            )));
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.categories.read().await.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = self.categories.read().await;
        let mut active: Vec<_> = categories.values().filter(|c| c.is_active).cloned().collect();
        active.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(active)
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn get_cart(&self, user: UserId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&user).cloned())
    }

    async fn save_cart(&self, mut cart: Cart) -> Result<Cart> {
        let mut carts = self.carts.write().await;
        if let Some(existing) = carts.get(&cart.user) {
            cart.id = existing.id;
            cart.created_at = existing.created_at;
        }
        cart.updated_at = Utc::now();
        carts.insert(cart.user, cart.clone());
        Ok(cart)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if orders
            .values()
            .any(|o| o.id == order.id || o.order_number == order.order_number)
        {
            return Err(StoreError::Conflict(format!(
                "order number {} already exists",
                order.order_number
            )));
        }
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Page<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<_> = orders
            .values()
            .filter(|o| {
                if let Some(user) = query.user
                    && o.user != user
                {
                    return false;
                }
                if let Some(seller) = query.seller
                    && !o.involves_seller(seller)
                {
                    return false;
                }
                if let Some(status) = query.status
                    && o.order_status != status
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        // Newest first
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(Page::from_sorted(matching, query.page))
    }

    async fn update_status(
        &self,
        id: OrderId,
        change: &StatusChange,
        allowed_from: &[OrderStatus],
    ) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Order", id))?;

        if !allowed_from.contains(&order.order_status) {
            return Err(StoreError::StatusConflict {
                order: id,
                current: order.order_status,
            });
        }

        change.apply_to(order);
        Ok(order.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.id == user.id || u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Conflict(format!(
                "user {} already exists",
                user.username
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_user(&self, mut user: User) -> Result<User> {
        let mut users = self.users.write().await;
        let stored = users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::not_found("User", user.id))?;
        user.updated_at = Utc::now();
        *stored = user.clone();
        Ok(user)
    }

    async fn insert_token(&self, token: &str, user: UserId) -> Result<()> {
        self.tokens.write().await.insert(token.to_string(), user);
        Ok(())
    }

    async fn user_for_token(&self, token: &str) -> Result<Option<User>> {
        let Some(id) = self.tokens.read().await.get(token).copied() else {
            return Ok(None);
        };
        Ok(self
            .users
            .read()
            .await
            .get(&id)
            .filter(|u| u.is_active)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::fixtures::product;
    use common::{PageRequest, UserRole};

    #[tokio::test]
    async fn test_reserve_stock_decrements_and_counts_sold() {
        let store = InMemoryStore::new();
        let p = store.insert_product(product("Mug", 10, 5)).await.unwrap();

        let updated = store.reserve_stock(p.id, 3).await.unwrap();
        assert_eq!(updated.stock, 2);
        assert_eq!(updated.sold, 3);
    }

    #[tokio::test]
    async fn test_reserve_stock_rejects_overdraw_without_change() {
        let store = InMemoryStore::new();
        let p = store.insert_product(product("Mug", 10, 2)).await.unwrap();

        let err = store.reserve_stock(p.id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientStock { available: 2, requested: 3, .. }
        ));
        assert_eq!(store.get_product(p.id).await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_reserve_stock_treats_inactive_as_missing() {
        let store = InMemoryStore::new();
        let mut p = product("Mug", 10, 2);
        p.is_active = false;
        let p = store.insert_product(p).await.unwrap();

        let err = store.reserve_stock(p.id, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_restore_stock_saturates_sold() {
        let store = InMemoryStore::new();
        let p = store.insert_product(product("Mug", 10, 0)).await.unwrap();

        assert!(store.restore_stock(p.id, 4).await.unwrap());
        let stored = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 4);
        assert_eq!(stored.sold, 0);

        assert!(!store.restore_stock(ProductId::new(), 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_product_keeps_sold_and_views() {
        let store = InMemoryStore::new();
        let p = store.insert_product(product("Mug", 10, 5)).await.unwrap();
        store.reserve_stock(p.id, 1).await.unwrap();
        store.increment_view_count(p.id).await.unwrap();

        let mut edit = p.clone();
        edit.name = "Big Mug".to_string();
        edit.sold = 99;
        edit.view_count = 0;
        let updated = store.update_product(edit).await.unwrap();

        assert_eq!(updated.name, "Big Mug");
        assert_eq!(updated.sold, 1);
        assert_eq!(updated.view_count, 1);
    }

    #[tokio::test]
    async fn test_stale_edit_keeps_reservation_made_after_read() {
        let store = InMemoryStore::new();
        let p = store.insert_product(product("Mug", 10, 5)).await.unwrap();

        // A seller reads the product, a checkout reserves, then the edit lands.
        let mut edit = store.get_product(p.id).await.unwrap().unwrap();
        store.reserve_stock(p.id, 3).await.unwrap();
        edit.name = "Big Mug".to_string();
        let updated = store.update_product(edit).await.unwrap();

        assert_eq!(updated.name, "Big Mug");
        assert_eq!((updated.stock, updated.sold), (2, 3));
        let stored = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!((stored.stock, stored.sold), (2, 3));
    }

    #[tokio::test]
    async fn test_set_stock_leaves_sold_alone() {
        let store = InMemoryStore::new();
        let p = store.insert_product(product("Mug", 10, 5)).await.unwrap();
        store.reserve_stock(p.id, 2).await.unwrap();

        let updated = store.set_stock(p.id, 40).await.unwrap();
        assert_eq!((updated.stock, updated.sold), (40, 2));

        let err = store.set_stock(ProductId::new(), 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_query_products_pages_and_counts() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .insert_product(product(&format!("P{i}"), i + 1, 1))
                .await
                .unwrap();
        }

        let page = store
            .query_products(
                ProductQuery::new()
                    .sort_by(crate::SortField::Price, crate::SortOrder::Asc)
                    .page(PageRequest::new(2, 2)),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "P2");
        assert_eq!(page.pagination().pages, 3);
    }

    #[tokio::test]
    async fn test_save_cart_keeps_one_cart_per_user() {
        let store = InMemoryStore::new();
        let user = UserId::new();

        let first = store.save_cart(Cart::empty(user)).await.unwrap();
        let second = store.save_cart(Cart::empty(user)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.get_cart(user).await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_token_lookup_skips_inactive_users() {
        let store = InMemoryStore::new();
        let mut user = User::new("ann", "ann@example.com", UserRole::User);
        user = store.insert_user(user).await.unwrap();
        store.insert_token("tok", user.id).await.unwrap();

        assert!(store.user_for_token("tok").await.unwrap().is_some());
        assert!(store.user_for_token("nope").await.unwrap().is_none());

        user.is_active = false;
        store.update_user(user).await.unwrap();
        assert!(store.user_for_token("tok").await.unwrap().is_none());
    }
}
