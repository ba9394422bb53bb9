use async_trait::async_trait;
use common::{CartId, CategoryId, Money, OrderId, OrderStatus, Page, ProductId, UserId};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sqlx::{
    PgPool, Postgres, Row,
    postgres::{PgArguments, PgRow},
    query::Query,
};
use uuid::Uuid;

use crate::{
    Cart, CartStore, Category, CategoryStore, Order, OrderQuery, OrderStore, Product,
    ProductQuery, ProductStore, Result, StatusChange, StoreError, User, UserStore,
    product::Rating,
};

const PRODUCT_COLUMNS: &str = "id, name, description, price, original_price, category_id, \
    subcategory, brand, images, thumbnail, condition, stock, sold, rating_average, rating_count, \
    seller_id, shipping, variants, tags, is_active, is_featured, view_count, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image, parent_id, level, is_active, \
    sort_order, created_at, updated_at";

const CART_COLUMNS: &str = "id, user_id, items, total_amount, total_items, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, order_number, items, shipping_address, payment_method, \
    payment_status, order_status, subtotal, shipping_fee, tax, discount, total_amount, \
    tracking_number, estimated_delivery, actual_delivery, notes, created_at, updated_at";

const USER_COLUMNS: &str = "id, username, email, role, is_active, profile, created_at, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::new(row.try_get::<Decimal, _>("price")?),
            original_price: row
                .try_get::<Option<Decimal>, _>("original_price")?
                .map(Money::new),
            category: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            subcategory: row.try_get("subcategory")?,
            brand: row.try_get("brand")?,
            images: json_column(&row, "images")?,
            thumbnail: row.try_get("thumbnail")?,
            condition: row.try_get::<String, _>("condition")?.parse()?,
            stock: to_u32(row.try_get("stock")?, "stock")?,
            sold: to_u32(row.try_get("sold")?, "sold")?,
            rating: Rating {
                average: row.try_get("rating_average")?,
                count: to_u32(row.try_get("rating_count")?, "rating_count")?,
            },
            seller: UserId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
            shipping: json_column(&row, "shipping")?,
            variants: json_column(&row, "variants")?,
            tags: row.try_get("tags")?,
            is_active: row.try_get("is_active")?,
            is_featured: row.try_get("is_featured")?,
            view_count: u64::try_from(row.try_get::<i64, _>("view_count")?)
                .map_err(|_| StoreError::InvalidData("negative view_count".to_string()))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_category(row: PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            image: row.try_get("image")?,
            parent: row
                .try_get::<Option<Uuid>, _>("parent_id")?
                .map(CategoryId::from_uuid),
            level: to_u32(row.try_get("level")?, "level")?,
            is_active: row.try_get("is_active")?,
            sort_order: row.try_get("sort_order")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart(row: PgRow) -> Result<Cart> {
        Ok(Cart {
            id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            items: json_column(&row, "items")?,
            total_amount: Money::new(row.try_get::<Decimal, _>("total_amount")?),
            total_items: to_u32(row.try_get("total_items")?, "total_items")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            order_number: row.try_get("order_number")?,
            items: json_column(&row, "items")?,
            shipping_address: json_column(&row, "shipping_address")?,
            payment_method: row.try_get::<String, _>("payment_method")?.parse()?,
            payment_status: row.try_get::<String, _>("payment_status")?.parse()?,
            order_status: row.try_get::<String, _>("order_status")?.parse()?,
            subtotal: Money::new(row.try_get::<Decimal, _>("subtotal")?),
            shipping_fee: Money::new(row.try_get::<Decimal, _>("shipping_fee")?),
            tax: Money::new(row.try_get::<Decimal, _>("tax")?),
            discount: Money::new(row.try_get::<Decimal, _>("discount")?),
            total_amount: Money::new(row.try_get::<Decimal, _>("total_amount")?),
            tracking_number: row.try_get("tracking_number")?,
            estimated_delivery: row.try_get("estimated_delivery")?,
            actual_delivery: row.try_get("actual_delivery")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            role: row.try_get::<String, _>("role")?.parse()?,
            is_active: row.try_get("is_active")?,
            profile: json_column(&row, "profile")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn json_column<T: DeserializeOwned>(row: &PgRow, column: &str) -> Result<T> {
    let value: serde_json::Value = row.try_get(column)?;
    Ok(serde_json::from_value(value)?)
}

fn to_u32(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidData(format!("negative {column}: {value}")))
}

fn to_i32(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::InvalidData(format!("{value} exceeds INTEGER")))
}

/// Escapes LIKE metacharacters and wraps the term for a substring match.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Builds the WHERE clause for a product query.
///
/// Returns the SQL and the number of placeholders used. Parameters must be
/// bound in the same order by [`bind_product_filters`].
fn product_filters(query: &ProductQuery) -> (String, usize) {
    let mut sql = String::from(" WHERE is_active");
    let mut param_count = 0;

    if query.category.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND category_id = ${param_count}"));
    }
    if query.min_price.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND price >= ${param_count}"));
    }
    if query.max_price.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND price <= ${param_count}"));
    }
    if !query.search_terms.is_empty() {
        param_count += 1;
        sql.push_str(&format!(
            " AND (name ILIKE ANY(${param_count}) OR description ILIKE ANY(${param_count}) \
             OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE ANY(${param_count})))"
        ));
    }
    if query.condition.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND condition = ${param_count}"));
    }
    if query.brand.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND brand = ${param_count}"));
    }
    if query.free_shipping.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND free_shipping = ${param_count}"));
    }
    if query.featured.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND is_featured = ${param_count}"));
    }
    if query.seller.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND seller_id = ${param_count}"));
    }

    (sql, param_count)
}

fn bind_product_filters<'q>(
    mut sqlx_query: Query<'q, Postgres, PgArguments>,
    query: &ProductQuery,
) -> Query<'q, Postgres, PgArguments> {
    if let Some(category) = query.category {
        sqlx_query = sqlx_query.bind(category.as_uuid());
    }
    if let Some(min) = query.min_price {
        sqlx_query = sqlx_query.bind(min.amount());
    }
    if let Some(max) = query.max_price {
        sqlx_query = sqlx_query.bind(max.amount());
    }
    if !query.search_terms.is_empty() {
        let patterns: Vec<String> = query.search_terms.iter().map(|t| like_pattern(t)).collect();
        sqlx_query = sqlx_query.bind(patterns);
    }
    if let Some(condition) = query.condition {
        sqlx_query = sqlx_query.bind(condition.as_str());
    }
    if let Some(ref brand) = query.brand {
        sqlx_query = sqlx_query.bind(brand.clone());
    }
    if let Some(free) = query.free_shipping {
        sqlx_query = sqlx_query.bind(free);
    }
    if let Some(featured) = query.featured {
        sqlx_query = sqlx_query.bind(featured);
    }
    if let Some(seller) = query.seller {
        sqlx_query = sqlx_query.bind(seller.as_uuid());
    }
    sqlx_query
}

fn order_filters(query: &OrderQuery) -> (String, usize) {
    let mut sql = String::from(" WHERE 1=1");
    let mut param_count = 0;

    if query.user.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND user_id = ${param_count}"));
    }
    if query.seller.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND ${param_count} = ANY(seller_ids)"));
    }
    if query.status.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND order_status = ${param_count}"));
    }

    (sql, param_count)
}

fn bind_order_filters<'q>(
    mut sqlx_query: Query<'q, Postgres, PgArguments>,
    query: &OrderQuery,
) -> Query<'q, Postgres, PgArguments> {
    if let Some(user) = query.user {
        sqlx_query = sqlx_query.bind(user.as_uuid());
    }
    if let Some(seller) = query.seller {
        sqlx_query = sqlx_query.bind(seller.as_uuid());
    }
    if let Some(status) = query.status {
        sqlx_query = sqlx_query.bind(status.as_str());
    }
    sqlx_query
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn insert_product(&self, product: Product) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (id, name, description, price, original_price, category_id,
                subcategory, brand, images, thumbnail, condition, stock, sold, rating_average,
                rating_count, seller_id, shipping, variants, tags, is_active, is_featured,
                view_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23, $24)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.original_price.map(|p| p.amount()))
        .bind(product.category.as_uuid())
        .bind(&product.subcategory)
        .bind(&product.brand)
        .bind(serde_json::to_value(&product.images)?)
        .bind(&product.thumbnail)
        .bind(product.condition.as_str())
        .bind(to_i32(product.stock)?)
        .bind(to_i32(product.sold)?)
        .bind(product.rating.average)
        .bind(to_i32(product.rating.count)?)
        .bind(product.seller.as_uuid())
        .bind(serde_json::to_value(&product.shipping)?)
        .bind(serde_json::to_value(&product.variants)?)
        .bind(&product.tags)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(i64::try_from(product.view_count).unwrap_or(i64::MAX))
        .bind(product.created_at)
        .bind(product.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(&self, product: Product) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name = $2, description = $3, price = $4, original_price = $5, category_id = $6,
                subcategory = $7, brand = $8, images = $9, thumbnail = $10, condition = $11,
                rating_average = $12, rating_count = $13, shipping = $14,
                variants = $15, tags = $16, is_active = $17, is_featured = $18,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.original_price.map(|p| p.amount()))
        .bind(product.category.as_uuid())
        .bind(&product.subcategory)
        .bind(&product.brand)
        .bind(serde_json::to_value(&product.images)?)
        .bind(&product.thumbnail)
        .bind(product.condition.as_str())
        .bind(product.rating.average)
        .bind(to_i32(product.rating.count)?)
        .bind(serde_json::to_value(&product.shipping)?)
        .bind(serde_json::to_value(&product.variants)?)
        .bind(&product.tags)
        .bind(product.is_active)
        .bind(product.is_featured)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(row),
            None => Err(StoreError::not_found("Product", product.id)),
        }
    }

    async fn set_stock(&self, id: ProductId, stock: u32) -> Result<Product> {
        let row = sqlx::query(&format!(
            "UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(to_i32(stock)?)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(row),
            None => Err(StoreError::not_found("Product", id)),
        }
    }

    async fn query_products(&self, query: ProductQuery) -> Result<Page<Product>> {
        let (filters, param_count) = product_filters(&query);

        let count_sql = format!("SELECT COUNT(*) AS total FROM products{filters}");
        let total: i64 = bind_product_filters(sqlx::query(&count_sql), &query)
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let page_sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products{filters} ORDER BY {} {}, id ASC LIMIT ${} OFFSET ${}",
            query.sort.column(),
            query.order.keyword(),
            param_count + 1,
            param_count + 2,
        );
        let rows = bind_product_filters(sqlx::query(&page_sql), &query)
            .bind(i64::from(query.page.limit()))
            .bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(Self::row_to_product)
                .collect::<Result<_>>()?,
            total: u64::try_from(total).unwrap_or(0),
            request: query.page,
        })
    }

    async fn increment_view_count(&self, id: ProductId) -> Result<()> {
        sqlx::query("UPDATE products SET view_count = view_count + 1 WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reserve_stock(&self, id: ProductId, quantity: u32) -> Result<Product> {
        let qty = to_i32(quantity)?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET stock = stock - $2, sold = sold + $2, updated_at = NOW()
            WHERE id = $1 AND is_active AND stock >= $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(qty)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_product(row);
        }

        // The guard failed; report why.
        let current = sqlx::query("SELECT stock, is_active FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = current else {
            return Err(StoreError::not_found("Product", id));
        };
        if !row.try_get::<bool, _>("is_active")? {
            return Err(StoreError::not_found("Product", id));
        }
        Err(StoreError::InsufficientStock {
            product: id,
            requested: quantity,
            available: to_u32(row.try_get("stock")?, "stock")?,
        })
    }

    async fn restore_stock(&self, id: ProductId, quantity: u32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2, sold = GREATEST(sold - $2, 0), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(to_i32(quantity)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CategoryStore for PostgresStore {
    async fn insert_category(&self, category: Category) -> Result<Category> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO categories (id, name, slug, description, image, parent_id, level,
                is_active, sort_order, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.image)
        .bind(category.parent.map(|p| p.as_uuid()))
        .bind(to_i32(category.level)?)
        .bind(category.is_active)
        .bind(category.sort_order)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_category(row)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_category).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active ORDER BY sort_order ASC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_category).collect()
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn get_cart(&self, user: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query(&format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"))
            .bind(user.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_cart).transpose()
    }

    async fn save_cart(&self, cart: Cart) -> Result<Cart> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO carts (id, user_id, items, total_amount, total_items, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                items = EXCLUDED.items,
                total_amount = EXCLUDED.total_amount,
                total_items = EXCLUDED.total_items,
                updated_at = NOW()
            RETURNING {CART_COLUMNS}
            "#
        ))
        .bind(cart.id.as_uuid())
        .bind(cart.user.as_uuid())
        .bind(serde_json::to_value(&cart.items)?)
        .bind(cart.total_amount.amount())
        .bind(to_i32(cart.total_items)?)
        .bind(cart.created_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_cart(row)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: Order) -> Result<Order> {
        let seller_ids: Vec<Uuid> = order.seller_ids().into_iter().map(Uuid::from).collect();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (id, user_id, order_number, items, seller_ids, shipping_address,
                payment_method, payment_status, order_status, subtotal, shipping_fee, tax,
                discount, total_amount, tracking_number, estimated_delivery, actual_delivery,
                notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.id.as_uuid())
        .bind(order.user.as_uuid())
        .bind(&order.order_number)
        .bind(serde_json::to_value(&order.items)?)
        .bind(seller_ids)
        .bind(serde_json::to_value(&order.shipping_address)?)
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.order_status.as_str())
        .bind(order.subtotal.amount())
        .bind(order.shipping_fee.amount())
        .bind(order.tax.amount())
        .bind(order.discount.amount())
        .bind(order.total_amount.amount())
        .bind(&order.tracking_number)
        .bind(order.estimated_delivery)
        .bind(order.actual_delivery)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_order(row)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn query_orders(&self, query: OrderQuery) -> Result<Page<Order>> {
        let (filters, param_count) = order_filters(&query);

        let count_sql = format!("SELECT COUNT(*) AS total FROM orders{filters}");
        let total: i64 = bind_order_filters(sqlx::query(&count_sql), &query)
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let page_sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders{filters} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2,
        );
        let rows = bind_order_filters(sqlx::query(&page_sql), &query)
            .bind(i64::from(query.page.limit()))
            .bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(Self::row_to_order)
                .collect::<Result<_>>()?,
            total: u64::try_from(total).unwrap_or(0),
            request: query.page,
        })
    }

    async fn update_status(
        &self,
        id: OrderId,
        change: &StatusChange,
        allowed_from: &[OrderStatus],
    ) -> Result<Order> {
        let allowed: Vec<String> = allowed_from.iter().map(|s| s.as_str().to_string()).collect();

        let row = sqlx::query(&format!(
            r#"
            UPDATE orders SET
                order_status = $2,
                tracking_number = COALESCE($3, tracking_number),
                actual_delivery = COALESCE($4, actual_delivery),
                updated_at = NOW()
            WHERE id = $1 AND order_status = ANY($5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(change.status.as_str())
        .bind(&change.tracking_number)
        .bind(change.actual_delivery)
        .bind(allowed)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Self::row_to_order(row);
        }

        match self.get_order(id).await? {
            Some(order) => Err(StoreError::StatusConflict {
                order: id,
                current: order.order_status,
            }),
            None => Err(StoreError::not_found("Order", id)),
        }
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, username, email, role, is_active, profile, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(serde_json::to_value(&user.profile)?)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_user(row)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn update_user(&self, user: User) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET username = $2, email = $3, role = $4, is_active = $5, profile = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(serde_json::to_value(&user.profile)?)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_user(row),
            None => Err(StoreError::not_found("User", user.id)),
        }
    }

    async fn insert_token(&self, token: &str, user: UserId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO api_tokens (token, user_id) VALUES ($1, $2)
            ON CONFLICT (token) DO UPDATE SET user_id = EXCLUDED.user_id
            "#,
        )
        .bind(token)
        .bind(user.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user_for_token(&self, token: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.email, u.role, u.is_active, u.profile,
                u.created_at, u.updated_at
            FROM api_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = $1 AND u.is_active
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }
}
