//! Shared application state.

use checkout::{CheckoutCoordinator, CheckoutPolicy, OrderLifecycle};
use domain::{CartService, CatalogService, OrderService, UserService};
use store::Store;

/// Services shared by every handler.
pub struct AppState<S: Store> {
    pub catalog: CatalogService<S>,
    pub cart: CartService<S>,
    pub orders: OrderService<S>,
    pub users: UserService<S>,
    pub checkout: CheckoutCoordinator<S>,
    pub lifecycle: OrderLifecycle<S>,
    pub store: S,
}

impl<S: Store + Clone> AppState<S> {
    pub fn new(store: S, policy: CheckoutPolicy) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            cart: CartService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            users: UserService::new(store.clone()),
            checkout: CheckoutCoordinator::new(store.clone(), policy.pricing),
            lifecycle: OrderLifecycle::new(store.clone(), policy.strict_status_transitions),
            store,
        }
    }
}
