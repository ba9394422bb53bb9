//! Checkout input.

use common::{PaymentMethod, ProductId};
use domain::DomainError;
use serde::Deserialize;
use store::{ShippingAddress, VariantSelection};

/// One requested line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<VariantSelection>,
}

impl CheckoutItem {
    pub fn new(product: ProductId, quantity: u32) -> Self {
        Self {
            product,
            quantity,
            variant: None,
        }
    }

    pub fn with_variant(mut self, variant: VariantSelection) -> Self {
        self.variant = Some(variant);
        self
    }
}

/// Everything needed to place an order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Checks the request shape. Nothing is read from the store.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::invalid("Order must contain at least one item"));
        }
        for item in &self.items {
            if item.quantity < 1 {
                return Err(DomainError::invalid(format!(
                    "Quantity for product {} must be at least 1",
                    item.product
                )));
            }
            if item.variant.as_ref().is_some_and(|v| !v.is_well_formed()) {
                return Err(DomainError::invalid(
                    "Variant must have a name and an option",
                ));
            }
        }

        let missing = self.shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(DomainError::invalid(format!(
                "Shipping address is missing: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<CheckoutItem>) -> CheckoutRequest {
        CheckoutRequest {
            items,
            shipping_address: ShippingAddress {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip_code: "62701".to_string(),
                country: "US".to_string(),
            },
            payment_method: PaymentMethod::CreditCard,
            notes: None,
        }
    }

    #[test]
    fn test_rejects_empty_items() {
        let err = request(vec![]).validate().unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let err = request(vec![CheckoutItem::new(ProductId::new(), 0)])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_rejects_blank_variant() {
        let item = CheckoutItem::new(ProductId::new(), 1).with_variant(VariantSelection::new("", "red"));
        assert!(request(vec![item]).validate().is_err());
    }

    #[test]
    fn test_names_blank_address_fields() {
        let mut req = request(vec![CheckoutItem::new(ProductId::new(), 1)]);
        req.shipping_address.city = "  ".to_string();
        req.shipping_address.zip_code.clear();
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Shipping address is missing: city, zipCode");
    }

    #[test]
    fn test_deserializes_wire_shape() {
        let req: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "items": [{ "product": ProductId::new(), "quantity": 2 }],
            "shippingAddress": {
                "street": "1 Main St",
                "city": "Springfield",
                "state": "IL",
                "zipCode": "62701",
                "country": "US"
            },
            "paymentMethod": "cash_on_delivery"
        }))
        .unwrap();
        assert_eq!(req.payment_method, PaymentMethod::CashOnDelivery);
        assert!(req.validate().is_ok());
    }
}
