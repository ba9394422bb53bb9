//! Read access to orders.

use common::{OrderId, OrderStatus, Page, PageRequest, UserId};
use store::{Order, OrderQuery, Store, StoreExt, User};

use crate::error::{DomainError, Result};

/// Service for listing and reading orders.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The user's own orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user: UserId,
        page: PageRequest,
        status: Option<OrderStatus>,
    ) -> Result<Page<Order>> {
        let query = OrderQuery::for_user(user).status(status).page(page);
        Ok(self.store.query_orders(query).await?)
    }

    /// Orders with at least one line sold by `seller`, newest first.
    ///
    /// The status filter is part of the query, so `total` counts only
    /// matching orders.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_seller(
        &self,
        seller: UserId,
        page: PageRequest,
        status: Option<OrderStatus>,
    ) -> Result<Page<Order>> {
        let query = OrderQuery::for_seller(seller).status(status).page(page);
        Ok(self.store.query_orders(query).await?)
    }

    /// Loads an order visible to `requester`.
    ///
    /// The owner, an admin, and any seller of one of its lines may read it.
    #[tracing::instrument(skip(self, requester), fields(requester = %requester.id))]
    pub async fn get(&self, id: OrderId, requester: &User) -> Result<Order> {
        let order = self.store.require_order(id).await?;
        if !can_read(&order, requester) {
            return Err(DomainError::forbidden("Not authorized to view this order"));
        }
        Ok(order)
    }
}

fn can_read(order: &Order, requester: &User) -> bool {
    order.user == requester.id || requester.is_admin() || order.involves_seller(requester.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{memory_store, seed_order, seed_user};
    use common::UserRole;

    #[tokio::test]
    async fn test_owner_admin_and_seller_can_read() {
        let store = memory_store();
        let owner = seed_user(&store, UserRole::User).await;
        let seller = seed_user(&store, UserRole::Seller).await;
        let admin = seed_user(&store, UserRole::Admin).await;
        let stranger = seed_user(&store, UserRole::User).await;
        let order = seed_order(&store, owner.id, seller.id, OrderStatus::Pending).await;
        let service = OrderService::new(store.clone());

        assert!(service.get(order.id, &owner).await.is_ok());
        assert!(service.get(order.id, &seller).await.is_ok());
        assert!(service.get(order.id, &admin).await.is_ok());

        let err = service.get(order.id, &stranger).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = service.get(OrderId::new(), &owner).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_seller_listing_filters_status_before_paging() {
        let store = memory_store();
        let buyer = UserId::new();
        let seller = UserId::new();
        for _ in 0..3 {
            seed_order(&store, buyer, seller, OrderStatus::Pending).await;
        }
        seed_order(&store, buyer, seller, OrderStatus::Shipped).await;
        seed_order(&store, buyer, UserId::new(), OrderStatus::Shipped).await;
        let service = OrderService::new(store.clone());

        let shipped = service
            .list_for_seller(seller, PageRequest::new(1, 2), Some(OrderStatus::Shipped))
            .await
            .unwrap();
        assert_eq!(shipped.total, 1);
        assert_eq!(shipped.items.len(), 1);

        let all = service
            .list_for_seller(seller, PageRequest::new(1, 2), None)
            .await
            .unwrap();
        assert_eq!(all.total, 4);
        assert_eq!(all.items.len(), 2);
        assert_eq!(all.pagination().pages, 2);
    }

    #[tokio::test]
    async fn test_user_listing_is_scoped_to_owner() {
        let store = memory_store();
        let buyer = UserId::new();
        seed_order(&store, buyer, UserId::new(), OrderStatus::Pending).await;
        seed_order(&store, UserId::new(), UserId::new(), OrderStatus::Pending).await;
        let service = OrderService::new(store.clone());

        let mine = service
            .list_for_user(buyer, PageRequest::default(), None)
            .await
            .unwrap();
        assert_eq!(mine.total, 1);
        assert_eq!(mine.items[0].user, buyer);
    }
}
