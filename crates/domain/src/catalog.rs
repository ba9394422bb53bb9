//! Catalog service: product listings, product management and categories.

use chrono::Utc;
use common::{CategoryId, Money, Page, PageRequest, ProductCondition, ProductId, UserId};
use serde::Deserialize;
use store::{
    Category, Product, ProductQuery, ProductVariant, Rating, ShippingInfo, SortField, SortOrder,
    Store, StoreExt, User,
};

use crate::error::{DomainError, Result};

/// Most featured products returned at once.
pub const FEATURED_LIMIT: u32 = 20;

/// Highest accepted price, in major units.
pub const MAX_PRICE: i64 = 1_000_000_000;

/// Fields accepted when listing a new product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub original_price: Option<Money>,
    pub category: CategoryId,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Defaults to the first image.
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub condition: ProductCondition,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub shipping: ShippingInfo,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// A partial product edit. Absent fields are left unchanged.
///
/// `sold`, `seller`, `viewCount` and `rating` cannot be edited.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub original_price: Option<Money>,
    pub category: Option<CategoryId>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub images: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub condition: Option<ProductCondition>,
    pub stock: Option<u32>,
    pub shipping: Option<ShippingInfo>,
    pub variants: Option<Vec<ProductVariant>>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Fields accepted when creating a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    /// Derived from the name when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub parent: Option<CategoryId>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Service for browsing and managing the catalog.
#[derive(Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    /// Creates a new catalog service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists active products matching the query.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Page<Product>> {
        Ok(self.store.query_products(query).await?)
    }

    /// Loads an active product and counts the view.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        let mut product = match self.store.get_product(id).await? {
            Some(product) if product.is_active => product,
            _ => return Err(DomainError::not_found("Product", id)),
        };

        self.store.increment_view_count(id).await?;
        product.view_count += 1;
        Ok(product)
    }

    /// Newest featured products.
    #[tracing::instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>> {
        let query = ProductQuery::new()
            .featured(true)
            .sort_by(SortField::CreatedAt, SortOrder::Desc)
            .page(PageRequest::new(1, FEATURED_LIMIT));
        Ok(self.store.query_products(query).await?.items)
    }

    /// Active products listed by one seller, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn seller_products(&self, seller: UserId, page: PageRequest) -> Result<Page<Product>> {
        Ok(self
            .store
            .query_products(ProductQuery::for_seller(seller).page(page))
            .await?)
    }

    /// Lists a new product owned by `actor`.
    #[tracing::instrument(skip(self, actor, input), fields(actor = %actor.id))]
    pub async fn create_product(&self, actor: &User, input: NewProduct) -> Result<Product> {
        if !actor.role.can_sell() {
            return Err(DomainError::forbidden("Only sellers can create products"));
        }
        if input.name.trim().is_empty() {
            return Err(DomainError::invalid("Product name is required"));
        }
        validate_price(input.price, "price")?;
        if let Some(original) = input.original_price {
            validate_price(original, "originalPrice")?;
        }
        self.require_category(input.category).await?;

        let now = Utc::now();
        let thumbnail = input
            .thumbnail
            .or_else(|| input.images.first().cloned())
            .unwrap_or_default();

        let product = Product {
            id: ProductId::new(),
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            original_price: input.original_price,
            category: input.category,
            subcategory: input.subcategory,
            brand: input.brand,
            images: input.images,
            thumbnail,
            condition: input.condition,
            stock: input.stock,
            sold: 0,
            rating: Rating::default(),
            seller: actor.id,
            shipping: input.shipping,
            variants: input.variants,
            tags: input.tags.into_iter().map(|t| t.trim().to_string()).collect(),
            is_active: true,
            is_featured: input.is_featured,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        let product = self.store.insert_product(product).await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Applies a partial edit. Only the owning seller or an admin may edit.
    #[tracing::instrument(skip(self, actor, update), fields(actor = %actor.id))]
    pub async fn update_product(
        &self,
        actor: &User,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product> {
        let mut product = self.owned_product(actor, id, "update").await?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(DomainError::invalid("Product name is required"));
            }
            product.name = name.trim().to_string();
        }
        if let Some(price) = update.price {
            validate_price(price, "price")?;
            product.price = price;
        }
        if let Some(original) = update.original_price {
            validate_price(original, "originalPrice")?;
            product.original_price = Some(original);
        }
        if let Some(category) = update.category {
            self.require_category(category).await?;
            product.category = category;
        }
        if let Some(description) = update.description {
            product.description = description;
        }
        if let Some(subcategory) = update.subcategory {
            product.subcategory = Some(subcategory);
        }
        if let Some(brand) = update.brand {
            product.brand = Some(brand);
        }
        if let Some(images) = update.images {
            product.images = images;
        }
        if let Some(thumbnail) = update.thumbnail {
            product.thumbnail = thumbnail;
        }
        if let Some(condition) = update.condition {
            product.condition = condition;
        }
        if let Some(shipping) = update.shipping {
            product.shipping = shipping;
        }
        if let Some(variants) = update.variants {
            product.variants = variants;
        }
        if let Some(tags) = update.tags {
            product.tags = tags;
        }
        if let Some(is_active) = update.is_active {
            product.is_active = is_active;
        }
        if let Some(is_featured) = update.is_featured {
            product.is_featured = is_featured;
        }

        // Stock is written on its own so an edit never undoes a reservation.
        let product = self.store.update_product(product).await?;
        match update.stock {
            Some(stock) => Ok(self.store.set_stock(id, stock).await?),
            None => Ok(product),
        }
    }

    /// Soft-deletes a product by marking it inactive.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_product(&self, actor: &User, id: ProductId) -> Result<()> {
        let mut product = self.owned_product(actor, id, "delete").await?;
        product.is_active = false;
        self.store.update_product(product).await?;
        tracing::info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    /// Active categories in display order.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    /// Creates a category. Admin only.
    #[tracing::instrument(skip(self, actor, input), fields(actor = %actor.id))]
    pub async fn create_category(&self, actor: &User, input: NewCategory) -> Result<Category> {
        if !actor.is_admin() {
            return Err(DomainError::forbidden("Only admins can create categories"));
        }
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid("Category name is required"));
        }

        let slug = match input.slug {
            Some(slug) if !slug.trim().is_empty() => slugify(&slug),
            _ => slugify(name),
        };
        if slug.is_empty() {
            return Err(DomainError::invalid("Category slug is empty"));
        }

        let level = match input.parent {
            Some(parent) => self.require_category(parent).await?.level + 1,
            None => 0,
        };

        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(),
            name: name.to_string(),
            slug,
            description: input.description,
            image: input.image,
            parent: input.parent,
            level,
            is_active: true,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };

        Ok(self.store.insert_category(category).await?)
    }

    async fn require_category(&self, id: CategoryId) -> Result<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", id))
    }

    async fn owned_product(&self, actor: &User, id: ProductId, action: &str) -> Result<Product> {
        let product = self.store.require_product(id).await?;
        if product.seller != actor.id && !actor.is_admin() {
            return Err(DomainError::forbidden(format!(
                "Not authorized to {action} this product"
            )));
        }
        Ok(product)
    }
}

fn validate_price(price: Money, field: &str) -> Result<()> {
    if price.is_negative() {
        return Err(DomainError::invalid(format!("{field} must not be negative")));
    }
    if price > Money::from_major(MAX_PRICE) {
        return Err(DomainError::invalid(format!(
            "{field} must not exceed {MAX_PRICE}"
        )));
    }
    Ok(())
}

/// Lowercases `text` and joins its alphanumeric runs with `-`.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
