//! Checkout coordinator.

use chrono::Utc;
use common::{Money, OrderId, OrderStatus, PaymentStatus, ProductId, UserId};
use domain::{DomainError, PricingPolicy, order_number};
use store::{Order, OrderItem, Product, Store, StoreError, StoreExt};

use crate::error::{CheckoutError, CompensationReport, Result};
use crate::request::{CheckoutItem, CheckoutRequest};

/// A stock reservation made during checkout, kept so it can be undone.
#[derive(Debug, Clone, Copy)]
struct Reservation {
    product: ProductId,
    quantity: u32,
}

/// Turns a checkout request into a placed order.
///
/// Steps run in order: check every line against the catalog, reserve stock
/// line by line, price the order, and insert it. Inserting the order is the
/// commit point. If anything fails before that, reservations already made are
/// restored in reverse order and the original error is returned. Clearing the
/// cart afterwards is best-effort.
#[derive(Clone)]
pub struct CheckoutCoordinator<S: Store> {
    store: S,
    pricing: PricingPolicy,
}

impl<S: Store> CheckoutCoordinator<S> {
    pub fn new(store: S, pricing: PricingPolicy) -> Self {
        Self { store, pricing }
    }

    /// Places an order for `user`.
    #[tracing::instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn checkout(&self, user: UserId, request: CheckoutRequest) -> Result<Order> {
        metrics::counter!("checkout_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.run(user, request).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                tracing::info!(order_id = %order.id, order_number = %order.order_number, "checkout completed");
            }
            Err(err) => {
                metrics::counter!("checkout_failed_total", "reason" => err.reason()).increment(1);
                tracing::warn!(%user, error = %err, "checkout failed");
            }
        }
        result
    }

    async fn run(&self, user: UserId, request: CheckoutRequest) -> Result<Order> {
        request.validate()?;
        for item in &request.items {
            self.check_line(item).await?;
        }

        let mut reservations = Vec::with_capacity(request.items.len());
        let order = match self.place(user, &request, &mut reservations).await {
            Ok(order) => order,
            Err(source) if reservations.is_empty() => return Err(source.into()),
            Err(source) => {
                let report = self.compensate(&reservations).await;
                return Err(CheckoutError::Compensated { source, report });
            }
        };

        self.clear_cart(user).await;
        Ok(order)
    }

    /// Fails fast on lines that cannot be fulfilled, before touching stock.
    async fn check_line(&self, item: &CheckoutItem) -> std::result::Result<(), DomainError> {
        let product = self.available_product(item.product).await?;
        if product.stock < item.quantity {
            return Err(DomainError::insufficient_stock(&product, item.quantity));
        }
        ensure_priced(&product)?;
        product.price.checked_mul(item.quantity)?;
        Ok(())
    }

    /// Reserves every line and inserts the order. Each successful reservation
    /// is pushed to `reservations` before the next step runs.
    async fn place(
        &self,
        user: UserId,
        request: &CheckoutRequest,
        reservations: &mut Vec<Reservation>,
    ) -> std::result::Result<Order, DomainError> {
        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = self.reserve(line).await?;
            reservations.push(Reservation {
                product: product.id,
                quantity: line.quantity,
            });
            tracing::info!(product_id = %product.id, quantity = line.quantity, "stock reserved");

            // The price may have changed since the pre-check.
            ensure_priced(&product)?;
            items.push(OrderItem {
                product: product.id,
                name: product.name,
                image: product.thumbnail,
                price: product.price,
                quantity: line.quantity,
                variant: line.variant.clone(),
                seller: product.seller,
            });
        }

        let subtotal = Money::checked_sum(items.iter().map(OrderItem::line_total))?;
        let totals = self.pricing.totals(subtotal, request.payment_method)?;
        let now = Utc::now();

        let order = Order {
            id: OrderId::new(),
            user,
            order_number: order_number::generate(now),
            items,
            shipping_address: request.shipping_address.clone(),
            payment_method: request.payment_method,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Pending,
            subtotal: totals.subtotal,
            shipping_fee: totals.shipping_fee,
            tax: totals.tax,
            discount: totals.discount,
            total_amount: totals.total_amount,
            tracking_number: None,
            estimated_delivery: Some(self.pricing.estimated_delivery(now)),
            actual_delivery: None,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        Ok(self.store.insert_order(order).await?)
    }

    async fn reserve(&self, line: &CheckoutItem) -> std::result::Result<Product, DomainError> {
        match self.store.reserve_stock(line.product, line.quantity).await {
            Ok(product) => Ok(product),
            // Lost a race for the last units: report it with the product name.
            Err(StoreError::InsufficientStock { available, .. }) => {
                let product = self.store.require_product(line.product).await?;
                Err(DomainError::InsufficientStock {
                    product: product.id,
                    name: product.name,
                    requested: line.quantity,
                    available,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn available_product(&self, id: ProductId) -> std::result::Result<Product, DomainError> {
        match self.store.get_product(id).await? {
            Some(product) if product.is_active => Ok(product),
            _ => Err(DomainError::not_found("Product", id)),
        }
    }

    /// Restores reserved stock, newest reservation first.
    #[tracing::instrument(skip(self, reservations), fields(count = reservations.len()))]
    async fn compensate(&self, reservations: &[Reservation]) -> CompensationReport {
        let mut report = CompensationReport::default();

        for reservation in reservations.iter().rev() {
            metrics::counter!("checkout_compensations_total").increment(1);
            match self
                .store
                .restore_stock(reservation.product, reservation.quantity)
                .await
            {
                Ok(true) => {
                    tracing::warn!(product_id = %reservation.product, quantity = reservation.quantity, "reservation restored");
                    report.restored.push(reservation.product);
                }
                Ok(false) => {
                    tracing::error!(product_id = %reservation.product, "cannot restore reservation: product is gone");
                    report
                        .failed
                        .push((reservation.product, "product not found".to_string()));
                }
                Err(err) => {
                    tracing::error!(product_id = %reservation.product, error = %err, "cannot restore reservation");
                    report.failed.push((reservation.product, err.to_string()));
                }
            }
        }

        if !report.is_complete() {
            metrics::counter!("checkout_compensation_failures_total")
                .increment(report.failed.len() as u64);
        }
        report
    }

    /// Empties the cart once the order exists. Failure does not undo the order.
    async fn clear_cart(&self, user: UserId) {
        let cleared = async {
            let mut cart = self.store.ensure_cart(user).await?;
            cart.clear();
            self.store.save_cart(cart).await
        }
        .await;

        if let Err(err) = cleared {
            tracing::warn!(%user, error = %err, "order placed but cart was not cleared");
        }
    }
}

fn ensure_priced(product: &Product) -> std::result::Result<(), DomainError> {
    if !product.price.is_positive() {
        return Err(DomainError::invalid(format!(
            "Product {} has no valid price",
            product.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::CheckoutItem;
    use common::{CategoryId, PaymentMethod, ProductCondition};
    use store::{
        CartStore, InMemoryStore, ProductStore, Rating, ShippingAddress, ShippingInfo,
    };

    async fn seed(store: &InMemoryStore, name: &str, price: i64, stock: u32) -> Product {
        let now = Utc::now();
        store
            .insert_product(Product {
                id: ProductId::new(),
                name: name.to_string(),
                description: String::new(),
                price: Money::from_major(price),
                original_price: None,
                category: CategoryId::new(),
                subcategory: None,
                brand: None,
                images: vec![],
                thumbnail: format!("/img/{name}.png"),
                condition: ProductCondition::New,
                stock,
                sold: 0,
                rating: Rating::default(),
                seller: UserId::new(),
                shipping: ShippingInfo::default(),
                variants: vec![],
                tags: vec![],
                is_active: true,
                is_featured: false,
                view_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

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

    fn coordinator(store: &InMemoryStore) -> CheckoutCoordinator<InMemoryStore> {
        CheckoutCoordinator::new(store.clone(), PricingPolicy::default())
    }

    #[tokio::test]
    async fn test_freezes_live_product_data_into_lines() {
        let store = InMemoryStore::new();
        let product = seed(&store, "Lamp", 40, 3).await;

        let order = coordinator(&store)
            .checkout(UserId::new(), request(vec![CheckoutItem::new(product.id, 2)]))
            .await
            .unwrap();

        let line = &order.items[0];
        assert_eq!(line.name, "Lamp");
        assert_eq!(line.image, "/img/Lamp.png");
        assert_eq!(line.seller, product.seller);
        assert_eq!(line.price, Money::from_major(40));
        assert_eq!(order.subtotal, Money::from_major(80));
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.order_number.starts_with(order_number::ORDER_NUMBER_PREFIX));
        assert!(order.estimated_delivery.unwrap() > order.created_at);
    }

    #[tokio::test]
    async fn test_later_line_failure_restores_earlier_reservations() {
        let store = InMemoryStore::new();
        let first = seed(&store, "First", 10, 5).await;
        let second = seed(&store, "Second", 10, 5).await;

        // The pre-check passes for each line alone, but together they overdraw.
        let err = coordinator(&store)
            .checkout(
                UserId::new(),
                request(vec![
                    CheckoutItem::new(first.id, 2),
                    CheckoutItem::new(second.id, 4),
                    CheckoutItem::new(second.id, 4),
                ]),
            )
            .await
            .unwrap_err();

        let (source, report) = match err {
            CheckoutError::Compensated { source, report } => (source, report),
            other => panic!("expected compensation, got {other:?}"),
        };
        assert!(matches!(
            source,
            DomainError::InsufficientStock { requested: 4, available: 1, ref name, .. } if name == "Second"
        ));
        assert_eq!(report.restored, vec![second.id, first.id]);
        assert!(report.is_complete());

        for id in [first.id, second.id] {
            let product = store.get_product(id).await.unwrap().unwrap();
            assert_eq!(product.stock, 5);
            assert_eq!(product.sold, 0);
        }
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_zero_price_is_rejected_before_reserving() {
        let store = InMemoryStore::new();
        let free = seed(&store, "Freebie", 0, 5).await;

        let err = coordinator(&store)
            .checkout(UserId::new(), request(vec![CheckoutItem::new(free.id, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Rejected(DomainError::InvalidArgument(_))));
        let product = store.get_product(free.id).await.unwrap().unwrap();
        assert_eq!((product.stock, product.sold), (5, 0));
    }

    async fn reprice(store: &InMemoryStore, product: Product, price: Money) -> Product {
        let mut product = product;
        product.price = price;
        store.update_product(product).await.unwrap()
    }

    fn huge_price() -> Money {
        Money::new(common::Decimal::from_i128_with_scale(5 * 10i128.pow(28), 0))
    }

    #[tokio::test]
    async fn test_line_total_overflow_is_rejected_before_reserving() {
        let store = InMemoryStore::new();
        let product = seed(&store, "Yacht", 1, 10).await;
        let product = reprice(&store, product, huge_price()).await;

        let err = coordinator(&store)
            .checkout(UserId::new(), request(vec![CheckoutItem::new(product.id, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Rejected(DomainError::InvalidArgument(_))));
        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!((product.stock, product.sold), (10, 0));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_subtotal_overflow_restores_every_reservation() {
        let store = InMemoryStore::new();
        let first = seed(&store, "Island", 1, 8).await;
        let first = reprice(&store, first, huge_price()).await;
        let second = seed(&store, "Castle", 1, 8).await;
        let second = reprice(&store, second, huge_price()).await;

        // Each line fits on its own; only their sum overflows.
        let err = coordinator(&store)
            .checkout(
                UserId::new(),
                request(vec![
                    CheckoutItem::new(first.id, 1),
                    CheckoutItem::new(second.id, 1),
                ]),
            )
            .await
            .unwrap_err();

        let report = match err {
            CheckoutError::Compensated {
                source: DomainError::InvalidArgument(_),
                report,
            } => report,
            other => panic!("expected compensation, got {other:?}"),
        };
        assert_eq!(report.restored, vec![second.id, first.id]);
        for id in [first.id, second.id] {
            let product = store.get_product(id).await.unwrap().unwrap();
            assert_eq!((product.stock, product.sold), (8, 0));
        }
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_precheck_failure_touches_nothing() {
        let store = InMemoryStore::new();
        let product = seed(&store, "Mug", 10, 5).await;

        let err = coordinator(&store)
            .checkout(
                UserId::new(),
                request(vec![
                    CheckoutItem::new(product.id, 1),
                    CheckoutItem::new(ProductId::new(), 1),
                ]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Rejected(DomainError::NotFound { .. })));
        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_clears_the_cart_even_when_it_never_existed() {
        let store = InMemoryStore::new();
        let product = seed(&store, "Pen", 2, 10).await;
        let user = UserId::new();

        coordinator(&store)
            .checkout(user, request(vec![CheckoutItem::new(product.id, 1)]))
            .await
            .unwrap();

        let cart = store.get_cart(user).await.unwrap().unwrap();
        assert!(cart.items.is_empty());
        assert!(cart.total_amount.is_zero());
    }
}
