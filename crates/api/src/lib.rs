//! HTTP API for the storefront.
//!
//! Exposes catalog, cart, checkout, order and profile endpoints over axum,
//! with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use common::UserRole;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{Store, User};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/cart", get(routes::cart::get::<S>))
        .route("/cart/summary", get(routes::cart::summary::<S>))
        .route("/cart/add", post(routes::cart::add::<S>))
        .route("/cart/update", put(routes::cart::update::<S>))
        .route("/cart/remove", delete(routes::cart::remove::<S>))
        .route("/cart/clear", delete(routes::cart::clear::<S>))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/seller/all", get(routes::orders::list_for_seller::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", put(routes::orders::update_status::<S>))
        .route("/orders/{id}/cancel", put(routes::orders::cancel::<S>))
        .route(
            "/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route("/products/featured/all", get(routes::products::featured::<S>))
        .route("/products/seller/{seller_id}", get(routes::products::by_seller::<S>))
        .route(
            "/products/{id}",
            get(routes::products::get::<S>)
                .put(routes::products::update::<S>)
                .delete(routes::products::delete::<S>),
        )
        .route(
            "/categories",
            get(routes::categories::list::<S>).post(routes::categories::create::<S>),
        )
        .route(
            "/users/profile",
            get(routes::users::profile::<S>).put(routes::users::update_profile::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Makes sure `token` authenticates an admin.
///
/// An existing mapping is kept as long as it points at an admin. Otherwise a
/// fresh admin user is created and the token is bound to it.
pub async fn provision_admin<S: Store>(store: &S, token: &str) -> store::Result<User> {
    if let Some(user) = store.user_for_token(token).await? {
        if user.role == UserRole::Admin {
            return Ok(user);
        }
    }

    let mut admin = User::new("admin", "admin@localhost", UserRole::Admin);
    let suffix = admin.id.to_string();
    let suffix = &suffix[..8];
    admin.username = format!("admin-{suffix}");
    admin.email = format!("admin-{suffix}@localhost");

    let admin = store.insert_user(admin).await?;
    store.insert_token(token, admin.id).await?;
    tracing::info!(user_id = %admin.id, "provisioned admin user");
    Ok(admin)
}
