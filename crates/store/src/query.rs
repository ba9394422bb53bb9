use common::{CategoryId, Money, OrderStatus, PageRequest, ProductCondition, UserId};

use crate::product::Product;

/// Field a product listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
    Name,
    Sold,
    Rating,
    ViewCount,
}

impl SortField {
    /// Parses the client-facing field name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" => Some(SortField::CreatedAt),
            "price" => Some(SortField::Price),
            "name" => Some(SortField::Name),
            "sold" => Some(SortField::Sold),
            "rating" | "rating.average" => Some(SortField::Rating),
            "viewCount" => Some(SortField::ViewCount),
            _ => None,
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Price => "price",
            SortField::Name => "name",
            SortField::Sold => "sold",
            SortField::Rating => "rating_average",
            SortField::ViewCount => "view_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Builder for product listings.
///
/// Only active products are ever listed.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category: Option<CategoryId>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// Lowercased search terms; a product matches if any term does.
    pub search_terms: Vec<String>,
    pub condition: Option<ProductCondition>,
    pub brand: Option<String>,
    pub free_shipping: Option<bool>,
    pub featured: Option<bool>,
    pub seller: Option<UserId>,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: PageRequest,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for the active products of one seller.
    pub fn for_seller(seller: UserId) -> Self {
        Self {
            seller: Some(seller),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn min_price(mut self, price: Money) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn max_price(mut self, price: Money) -> Self {
        self.max_price = Some(price);
        self
    }

    /// Splits `text` on whitespace into search terms.
    pub fn search(mut self, text: &str) -> Self {
        self.search_terms = text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        self
    }

    pub fn condition(mut self, condition: ProductCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn free_shipping(mut self, free_shipping: bool) -> Self {
        self.free_shipping = Some(free_shipping);
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = Some(featured);
        self
    }

    pub fn seller(mut self, seller: UserId) -> Self {
        self.seller = Some(seller);
        self
    }

    pub fn sort_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = field;
        self.order = order;
        self
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Returns true if `product` passes every filter.
    pub fn matches(&self, product: &Product) -> bool {
        if !product.is_active {
            return false;
        }
        if let Some(category) = self.category
            && product.category != category
        {
            return false;
        }
        if let Some(min) = self.min_price
            && product.price < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && product.price > max
        {
            return false;
        }
        if !self.search_terms.is_empty() && !product.matches_any_term(&self.search_terms) {
            return false;
        }
        if let Some(condition) = self.condition
            && product.condition != condition
        {
            return false;
        }
        if let Some(ref brand) = self.brand
            && product.brand.as_deref() != Some(brand.as_str())
        {
            return false;
        }
        if let Some(free) = self.free_shipping
            && product.shipping.free_shipping != free
        {
            return false;
        }
        if let Some(featured) = self.featured
            && product.is_featured != featured
        {
            return false;
        }
        if let Some(seller) = self.seller
            && product.seller != seller
        {
            return false;
        }
        true
    }

    /// Orders two products by the requested field and direction.
    pub fn compare(&self, a: &Product, b: &Product) -> std::cmp::Ordering {
        let ordering = match self.sort {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Price => a.price.cmp(&b.price),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Sold => a.sold.cmp(&b.sold),
            SortField::Rating => a.rating.average.total_cmp(&b.rating.average),
            SortField::ViewCount => a.view_count.cmp(&b.view_count),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Filter for order listings. Results are always newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub user: Option<UserId>,
    /// Orders with at least one line sold by this user.
    pub seller: Option<UserId>,
    pub status: Option<OrderStatus>,
    pub page: PageRequest,
}

impl OrderQuery {
    pub fn for_user(user: UserId) -> Self {
        Self {
            user: Some(user),
            ..Default::default()
        }
    }

    pub fn for_seller(seller: UserId) -> Self {
        Self {
            seller: Some(seller),
            ..Default::default()
        }
    }

    pub fn status(mut self, status: Option<OrderStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }
}
