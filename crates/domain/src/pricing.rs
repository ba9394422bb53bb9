//! Order totals.

use chrono::{DateTime, Duration, Utc};
use common::{AmountOverflow, Money, PaymentMethod};
use rust_decimal::Decimal;
use serde::Serialize;

/// Fee, tax and delivery settings applied when an order is placed.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    /// Flat fee charged for cash-on-delivery orders.
    pub cod_shipping_fee: Money,
    /// Tax rate applied to the subtotal, e.g. `0.10`.
    pub tax_rate: Decimal,
    /// Days from placement to the estimated delivery date.
    pub delivery_days: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            cod_shipping_fee: Money::from_major(15000),
            tax_rate: Decimal::new(10, 2),
            delivery_days: 7,
        }
    }
}

impl PricingPolicy {
    /// Computes the totals for an order with the given subtotal.
    pub fn totals(
        &self,
        subtotal: Money,
        payment_method: PaymentMethod,
    ) -> Result<OrderTotals, AmountOverflow> {
        let shipping_fee = match payment_method {
            PaymentMethod::CashOnDelivery => self.cod_shipping_fee,
            _ => Money::zero(),
        };
        let tax = subtotal.checked_apply_rate(self.tax_rate)?;
        let discount = Money::zero();
        let total_amount = subtotal
            .checked_add(shipping_fee)?
            .checked_add(tax)?
            .checked_sub(discount)?;

        Ok(OrderTotals {
            subtotal,
            shipping_fee,
            tax,
            discount,
            total_amount,
        })
    }

    pub fn estimated_delivery(&self, placed_at: DateTime<Utc>) -> DateTime<Utc> {
        placed_at + Duration::days(self.delivery_days)
    }
}

/// The money fields of an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub tax: Money,
    pub discount: Money,
    pub total_amount: Money,
}
