//! Cart service.
//!
//! Every operation first makes sure the user has a cart, so first-time users
//! never see a "cart not found" error. Lines are keyed by `(product, variant)`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{CartId, Money, ProductId, UserId};
use serde::Serialize;
use store::{
    Cart, CartItem, CartSummary, Product, ProductSummary, Store, StoreExt, VariantSelection,
};

use crate::error::{DomainError, Result};

/// A cart line together with the live product it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: CartItem,
    /// Absent once the product has been removed from the catalog.
    pub product_details: Option<ProductSummary>,
}

/// A cart as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub user: UserId,
    pub items: Vec<CartLineView>,
    pub total_amount: Money,
    pub total_items: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Service for managing shopping carts.
#[derive(Clone)]
pub struct CartService<S: Store> {
    store: S,
}

impl<S: Store> CartService<S> {
    /// Creates a new cart service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart, creating an empty one on first access.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user: UserId) -> Result<CartView> {
        let cart = self.store.ensure_cart(user).await?;
        self.view(cart).await
    }

    /// Adds `quantity` units of a product, merging with an existing line.
    #[tracing::instrument(skip(self))]
    pub async fn add(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
        variant: Option<VariantSelection>,
    ) -> Result<CartView> {
        if quantity < 1 {
            return Err(DomainError::invalid("Quantity must be at least 1"));
        }
        validate_variant(variant.as_ref())?;

        let product = self.active_product(product_id).await?;
        if product.stock < quantity {
            return Err(DomainError::insufficient_stock(&product, quantity));
        }

        let mut cart = self.store.ensure_cart(user).await?;
        match cart.line_index(product_id, variant.as_ref()) {
            Some(index) => {
                let line = &mut cart.items[index];
                let new_quantity = line.quantity.saturating_add(quantity);
                if product.stock < new_quantity {
                    return Err(DomainError::insufficient_stock(&product, new_quantity));
                }
                line.quantity = new_quantity;
            }
            None => cart.items.push(CartItem {
                product: product_id,
                quantity,
                variant,
                price: product.price,
            }),
        }

        metrics::counter!("cart_mutations_total", "op" => "add").increment(1);
        self.persist(cart).await
    }

    /// Sets the quantity of an existing line.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
        variant: Option<VariantSelection>,
    ) -> Result<CartView> {
        if quantity < 1 {
            return Err(DomainError::invalid("Quantity must be at least 1"));
        }

        let product = self.active_product(product_id).await?;
        if quantity > product.stock {
            return Err(DomainError::insufficient_stock(&product, quantity));
        }

        let mut cart = self.store.ensure_cart(user).await?;
        let index = cart
            .line_index(product_id, variant.as_ref())
            .ok_or_else(|| DomainError::not_found("Cart item", product_id))?;
        cart.items[index].quantity = quantity;

        metrics::counter!("cart_mutations_total", "op" => "update").increment(1);
        self.persist(cart).await
    }

    /// Removes the line for `(product, variant)`.
    #[tracing::instrument(skip(self))]
    pub async fn remove(
        &self,
        user: UserId,
        product_id: ProductId,
        variant: Option<VariantSelection>,
    ) -> Result<CartView> {
        let mut cart = self.store.ensure_cart(user).await?;
        let index = cart
            .line_index(product_id, variant.as_ref())
            .ok_or_else(|| DomainError::not_found("Cart item", product_id))?;
        cart.items.remove(index);

        metrics::counter!("cart_mutations_total", "op" => "remove").increment(1);
        self.persist(cart).await
    }

    /// Empties the cart. Clearing an empty cart is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user: UserId) -> Result<CartView> {
        let mut cart = self.store.ensure_cart(user).await?;
        cart.clear();

        metrics::counter!("cart_mutations_total", "op" => "clear").increment(1);
        self.persist(cart).await
    }

    /// Returns the cart totals without creating a cart.
    #[tracing::instrument(skip(self))]
    pub async fn summary(&self, user: UserId) -> Result<CartSummary> {
        Ok(self
            .store
            .get_cart(user)
            .await?
            .map(|cart| cart.summary())
            .unwrap_or_default())
    }

    async fn active_product(&self, id: ProductId) -> Result<Product> {
        match self.store.get_product(id).await? {
            Some(product) if product.is_active => Ok(product),
            _ => Err(DomainError::not_found("Product", id)),
        }
    }

    async fn persist(&self, mut cart: Cart) -> Result<CartView> {
        cart.recalculate_totals()?;
        let cart = self.store.save_cart(cart).await?;
        self.view(cart).await
    }

    async fn view(&self, cart: Cart) -> Result<CartView> {
        let ids: Vec<ProductId> = cart.items.iter().map(|item| item.product).collect();
        let products: HashMap<ProductId, Product> = if ids.is_empty() {
            HashMap::new()
        } else {
            self.store
                .get_products(&ids)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        Ok(CartView {
            id: cart.id,
            user: cart.user,
            items: cart
                .items
                .into_iter()
                .map(|item| CartLineView {
                    product_details: products.get(&item.product).map(Product::summary),
                    item,
                })
                .collect(),
            total_amount: cart.total_amount,
            total_items: cart.total_items,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        })
    }
}

pub(crate) fn validate_variant(variant: Option<&VariantSelection>) -> Result<()> {
    match variant {
        Some(v) if !v.is_well_formed() => Err(DomainError::invalid(
            "Variant must have a name and an option",
        )),
        _ => Ok(()),
    }
}
