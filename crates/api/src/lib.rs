//! HTTP API server with observability for the cart orchestration system.
//!
//! Provides REST endpoints for cart lifecycle management (create,
//! update, checkout, cancel, query), with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::Catalog;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{
    ActivityConfig, CART_TASK_QUEUE, CartActivities, CartWorkflow, InMemoryMailClient,
    InMemoryPaymentClient, register_cart_activities,
};
use runtime::{ActivityRegistry, InMemoryRuntime};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::carts::AppState;

/// Storefront link embedded in abandonment reminders. Points at the
/// demo storefront, not this API.
const STOREFRONT_URL: &str = "http://localhost:8080";

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::carts::products))
        .route("/carts", post(routes::carts::create))
        .route("/carts/{id}", put(routes::carts::update))
        .route("/carts/{id}", get(routes::carts::get))
        .route("/carts/{id}", delete(routes::carts::cancel))
        .route("/carts/{id}/checkout", post(routes::carts::checkout))
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

/// Creates the default application state: demo catalog, in-memory
/// provider clients, activity registration, and the workflow host on
/// the fixed task queue.
///
/// The in-memory clients take no credentials; the Stripe/Resend keys
/// the config requires are consumed only by the real provider clients
/// of a non-demo deployment.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    let catalog = Catalog::demo();

    let activities = Arc::new(CartActivities::new(
        InMemoryPaymentClient::new(),
        InMemoryMailClient::new(),
        catalog.clone(),
        ActivityConfig {
            from_email: config.from_email.clone(),
            fallback_email: config.fallback_email.clone(),
            storefront_url: STOREFRONT_URL.to_string(),
        },
    ));

    let mut registry = ActivityRegistry::new();
    register_cart_activities(&mut registry, activities);

    let runtime = InMemoryRuntime::new(CART_TASK_QUEUE, registry);
    let workflow = Arc::new(CartWorkflow::new(config.abandonment_window));

    Arc::new(AppState {
        runtime,
        workflow,
        catalog,
    })
}
