use chrono::{DateTime, Utc};
use common::{AmountOverflow, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::product::VariantSelection;

/// A frozen copy of a product line taken at checkout.
///
/// Later edits to the product never change an order item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductId,
    pub name: String,
    pub image: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantSelection>,
    pub seller: UserId,
}

impl OrderItem {
    pub fn line_total(&self) -> Result<Money, AmountOverflow> {
        self.price.checked_mul(self.quantity)
    }
}

/// Delivery address embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Returns the names of any blank fields.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub tax: Money,
    pub discount: Money,
    pub total_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_delivery: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns true if any line was sold by `seller`.
    pub fn involves_seller(&self, seller: UserId) -> bool {
        self.items.iter().any(|item| item.seller == seller)
    }

    /// Distinct sellers of this order's lines, in first-seen order.
    pub fn seller_ids(&self) -> Vec<UserId> {
        let mut sellers = Vec::new();
        for item in &self.items {
            if !sellers.contains(&item.seller) {
                sellers.push(item.seller);
            }
        }
        sellers
    }
}

/// Field changes applied together with a status move.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: OrderStatus,
    /// Replaces the tracking number when set.
    pub tracking_number: Option<String>,
    /// Stamps the delivery time when set.
    pub actual_delivery: Option<DateTime<Utc>>,
}

impl StatusChange {
    pub fn to(status: OrderStatus) -> Self {
        Self {
            status,
            tracking_number: None,
            actual_delivery: None,
        }
    }

    pub fn tracking_number(mut self, tracking_number: Option<String>) -> Self {
        self.tracking_number = tracking_number;
        self
    }

    pub fn actual_delivery(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.actual_delivery = at;
        self
    }

    /// Applies the change to an in-memory order.
    pub(crate) fn apply_to(&self, order: &mut Order) {
        order.order_status = self.status;
        if let Some(tracking) = &self.tracking_number {
            order.tracking_number = Some(tracking.clone());
        }
        if let Some(at) = self.actual_delivery {
            order.actual_delivery = Some(at);
        }
        order.updated_at = Utc::now();
    }
}
