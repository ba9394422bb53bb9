use chrono::{DateTime, Utc};
use common::{AmountOverflow, CartId, Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::product::VariantSelection;

/// One line of a cart, identified by its `(product, variant)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantSelection>,
    /// Unit price captured when the line was first added.
    pub price: Money,
}

impl CartItem {
    /// Returns `price × quantity` for this line.
    pub fn line_total(&self) -> Result<Money, AmountOverflow> {
        self.price.checked_mul(self.quantity)
    }

    /// Returns true if this line is for the given product and variant.
    pub fn is_line_for(&self, product: ProductId, variant: Option<&VariantSelection>) -> bool {
        self.product == product && self.variant.as_ref() == variant
    }
}

/// A user's shopping cart. Each user has exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user: UserId,
    pub items: Vec<CartItem>,
    pub total_amount: Money,
    pub total_items: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn empty(user: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            user,
            items: Vec::new(),
            total_amount: Money::zero(),
            total_items: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the index of the line for `(product, variant)`.
    pub fn line_index(&self, product: ProductId, variant: Option<&VariantSelection>) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.is_line_for(product, variant))
    }

    /// Recomputes `total_amount` and `total_items` from the current lines.
    ///
    /// On overflow the cart is left unchanged.
    pub fn recalculate_totals(&mut self) -> Result<(), AmountOverflow> {
        let total_amount = Money::checked_sum(self.items.iter().map(CartItem::line_total))?;
        let total_items = self
            .items
            .iter()
            .try_fold(0u32, |acc, item| acc.checked_add(item.quantity))
            .ok_or(AmountOverflow)?;

        self.total_amount = total_amount;
        self.total_items = total_items;
        Ok(())
    }

    /// Removes every line and zeroes the totals.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total_amount = Money::zero();
        self.total_items = 0;
    }

    /// Returns the counts shown in the cart badge.
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            total_items: self.total_items,
            total_amount: self.total_amount,
            item_count: self.items.len(),
        }
    }
}

/// Cart totals without the lines.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_items: u32,
    pub total_amount: Money,
    pub item_count: usize,
}
