//! Order status changes after checkout.

use chrono::Utc;
use common::{OrderId, OrderStatus};
use domain::{DomainError, Result};
use store::{Order, StatusChange, Store, StoreError, StoreExt, User};

/// Moves orders through their lifecycle.
///
/// Cancellation is the only move with stock effects: once the status has
/// flipped to cancelled, every line's quantity goes back to its product.
#[derive(Clone)]
pub struct OrderLifecycle<S: Store> {
    store: S,
    strict: bool,
}

impl<S: Store> OrderLifecycle<S> {
    /// With `strict` set, status updates must follow
    /// [`OrderStatus::can_transition_to`].
    pub fn new(store: S, strict: bool) -> Self {
        Self { store, strict }
    }

    /// Sets the status of an order. Admin only.
    ///
    /// Delivering an order stamps `actualDelivery`. No stock is moved, even
    /// when the new status is cancelled.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn update_status(
        &self,
        id: OrderId,
        actor: &User,
        status: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<Order> {
        if !actor.is_admin() {
            return Err(DomainError::forbidden("Only admins can update order status"));
        }

        let allowed_from = if self.strict {
            OrderStatus::predecessors_of(status)
        } else {
            OrderStatus::ALL.to_vec()
        };
        let change = StatusChange::to(status)
            .tracking_number(tracking_number)
            .actual_delivery((status == OrderStatus::Delivered).then(Utc::now));

        let order = self
            .store
            .update_status(id, &change, &allowed_from)
            .await
            .map_err(|err| match err {
                StoreError::StatusConflict { current, .. } => DomainError::InvalidState(format!(
                    "Cannot change order status from {current} to {status}"
                )),
                other => other.into(),
            })?;

        metrics::counter!("order_status_updates_total", "status" => status.as_str()).increment(1);
        tracing::info!(order_id = %id, %status, "order status updated");
        Ok(order)
    }

    /// Cancels an order on behalf of its owner and returns its stock.
    #[tracing::instrument(skip(self, requester), fields(requester = %requester.id))]
    pub async fn cancel(&self, id: OrderId, requester: &User) -> Result<Order> {
        let order = self.store.require_order(id).await?;
        if order.user != requester.id {
            return Err(DomainError::forbidden("Not authorized to cancel this order"));
        }
        if !order.order_status.can_cancel() {
            let reason = if order.order_status.has_shipped() {
                "Cannot cancel order that has been shipped or delivered".to_string()
            } else {
                format!("Order is already {}", order.order_status)
            };
            return Err(DomainError::InvalidState(reason));
        }

        // A concurrent cancel loses here and restores nothing.
        let cancelled = self
            .store
            .update_status(
                id,
                &StatusChange::to(OrderStatus::Cancelled),
                &OrderStatus::CANCELLABLE,
            )
            .await?;

        for item in &cancelled.items {
            match self.store.restore_stock(item.product, item.quantity).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(product_id = %item.product, "cancelled line refers to a missing product");
                }
                Err(err) => {
                    tracing::error!(product_id = %item.product, error = %err, "failed to restore stock for cancelled line");
                }
            }
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %id, "order cancelled");
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, PaymentMethod, PaymentStatus, ProductId, UserId, UserRole};
    use store::{InMemoryStore, OrderItem, OrderStore, ShippingAddress, UserStore};

    async fn order_in(store: &InMemoryStore, owner: UserId, status: OrderStatus) -> Order {
        let now = Utc::now();
        let id = OrderId::new();
        store
            .insert_order(Order {
                id,
                user: owner,
                order_number: format!("ORD-{id}"),
                items: vec![OrderItem {
                    product: ProductId::new(),
                    name: "Gone".to_string(),
                    image: String::new(),
                    price: Money::from_major(5),
                    quantity: 1,
                    variant: None,
                    seller: UserId::new(),
                }],
                shipping_address: ShippingAddress {
                    street: "1 Main St".to_string(),
                    city: "Springfield".to_string(),
                    state: "IL".to_string(),
                    zip_code: "62701".to_string(),
                    country: "US".to_string(),
                },
                payment_method: PaymentMethod::Paypal,
                payment_status: PaymentStatus::Pending,
                order_status: status,
                subtotal: Money::from_major(5),
                shipping_fee: Money::zero(),
                tax: Money::zero(),
                discount: Money::zero(),
                total_amount: Money::from_major(5),
                tracking_number: None,
                estimated_delivery: None,
                actual_delivery: None,
                notes: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    async fn admin(store: &InMemoryStore) -> User {
        store
            .insert_user(User::new("root", "root@example.com", UserRole::Admin))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_lenient_mode_allows_any_move() {
        let store = InMemoryStore::new();
        let admin = admin(&store).await;
        let order = order_in(&store, UserId::new(), OrderStatus::Delivered).await;
        let lifecycle = OrderLifecycle::new(store.clone(), false);

        let updated = lifecycle
            .update_status(order.id, &admin, OrderStatus::Pending, None)
            .await
            .unwrap();
        assert_eq!(updated.order_status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_strict_mode_enforces_table() {
        let store = InMemoryStore::new();
        let admin = admin(&store).await;
        let order = order_in(&store, UserId::new(), OrderStatus::Pending).await;
        let lifecycle = OrderLifecycle::new(store.clone(), true);

        let err = lifecycle
            .update_status(order.id, &admin, OrderStatus::Delivered, None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot change order status from pending to delivered"
        );

        let processing = lifecycle
            .update_status(order.id, &admin, OrderStatus::Processing, None)
            .await
            .unwrap();
        assert_eq!(processing.order_status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_delivery_stamps_time_and_keeps_tracking() {
        let store = InMemoryStore::new();
        let admin = admin(&store).await;
        let order = order_in(&store, UserId::new(), OrderStatus::Processing).await;
        let lifecycle = OrderLifecycle::new(store.clone(), false);

        lifecycle
            .update_status(order.id, &admin, OrderStatus::Shipped, Some("TRK-1".to_string()))
            .await
            .unwrap();
        let delivered = lifecycle
            .update_status(order.id, &admin, OrderStatus::Delivered, None)
            .await
            .unwrap();

        assert_eq!(delivered.tracking_number.as_deref(), Some("TRK-1"));
        assert!(delivered.actual_delivery.is_some());
    }

    #[tokio::test]
    async fn test_only_admins_update_status() {
        let store = InMemoryStore::new();
        let owner = store
            .insert_user(User::new("buyer", "buyer@example.com", UserRole::User))
            .await
            .unwrap();
        let order = order_in(&store, owner.id, OrderStatus::Pending).await;
        let lifecycle = OrderLifecycle::new(store.clone(), false);

        let err = lifecycle
            .update_status(order.id, &owner, OrderStatus::Shipped, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_cancel_rejects_terminal_orders() {
        let store = InMemoryStore::new();
        let owner = store
            .insert_user(User::new("buyer", "buyer@example.com", UserRole::User))
            .await
            .unwrap();
        let lifecycle = OrderLifecycle::new(store.clone(), false);

        for status in [OrderStatus::Cancelled, OrderStatus::Returned] {
            let order = order_in(&store, owner.id, status).await;
            let err = lifecycle.cancel(order.id, &owner).await.unwrap_err();
            assert_eq!(err.to_string(), format!("Order is already {status}"));
        }
    }

    #[tokio::test]
    async fn test_cancel_rejects_shipped_orders_without_restoring() {
        let store = InMemoryStore::new();
        let owner = store
            .insert_user(User::new("buyer", "buyer@example.com", UserRole::User))
            .await
            .unwrap();
        let lifecycle = OrderLifecycle::new(store.clone(), false);

        for status in [OrderStatus::Shipped, OrderStatus::Delivered] {
            let order = order_in(&store, owner.id, status).await;
            let err = lifecycle.cancel(order.id, &owner).await.unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
            assert_eq!(
                err.to_string(),
                "Cannot cancel order that has been shipped or delivered"
            );
            let stored = store.get_order(order.id).await.unwrap().unwrap();
            assert_eq!(stored.order_status, status);
        }
    }

    #[tokio::test]
    async fn test_cancel_survives_missing_product() {
        let store = InMemoryStore::new();
        let owner = store
            .insert_user(User::new("buyer", "buyer@example.com", UserRole::User))
            .await
            .unwrap();
        let order = order_in(&store, owner.id, OrderStatus::Pending).await;
        let lifecycle = OrderLifecycle::new(store.clone(), false);

        let cancelled = lifecycle.cancel(order.id, &owner).await.unwrap();
        assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
    }
}
