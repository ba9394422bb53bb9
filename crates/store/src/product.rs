use chrono::{DateTime, Utc};
use common::{CategoryId, Money, ProductCondition, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// `stock` and `sold` are only changed through [`crate::ProductStore::reserve_stock`]
/// and [`crate::ProductStore::restore_stock`] once the product is listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
    pub category: CategoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub thumbnail: String,
    #[serde(default)]
    pub condition: ProductCondition,
    pub stock: u32,
    pub sold: u32,
    #[serde(default)]
    pub rating: Rating,
    pub seller: UserId,
    #[serde(default)]
    pub shipping: ShippingInfo,
    /// Declared variants. Their own `price`/`stock` overrides are stored but
    /// cart and checkout always use the parent product's price and stock.
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the fields shown next to cart lines.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            images: self.images.clone(),
            thumbnail: self.thumbnail.clone(),
            price: self.price,
            stock: self.stock,
        }
    }

    /// Text used for keyword search.
    pub(crate) fn matches_any_term(&self, terms: &[String]) -> bool {
        let name = self.name.to_lowercase();
        let description = self.description.to_lowercase();
        let tags: Vec<String> = self.tags.iter().map(|t| t.to_lowercase()).collect();

        terms.iter().any(|term| {
            name.contains(term.as_str())
                || description.contains(term.as_str())
                || tags.iter().any(|t| t.contains(term.as_str()))
        })
    }
}

/// Aggregate customer rating.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    pub average: f32,
    pub count: u32,
}

/// Shipping attributes of a product.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub free_shipping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// A named option group such as "Color" with its choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

/// A shopper's choice of one variant option, e.g. `{"name":"Color","option":"Red"}`.
///
/// Two selections are the same line only if both fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantSelection {
    pub name: String,
    pub option: String,
}

impl VariantSelection {
    pub fn new(name: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            option: option.into(),
        }
    }

    /// Returns true if both the name and the option are non-blank.
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty() && !self.option.trim().is_empty()
    }
}

/// The live product fields attached to cart responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub images: Vec<String>,
    pub thumbnail: String,
    pub price: Money,
    pub stock: u32,
}
