//! Catering Operations Platform - Backend Server
//!
//! Inventory, purchasing, menu costing and order settlement for catering
//! businesses, exposed as a JSON API for the dashboard.

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use external::PaymentProcessor;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub payments: Arc<dyn PaymentProcessor>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any);
    let cors = match state.config.cors.allowed_origin.as_str() {
        "*" => cors.allow_origin(Any),
        origin => match origin.parse::<HeaderValue>() {
            Ok(value) => cors.allow_origin(value),
            Err(_) => {
                tracing::warn!(origin, "Invalid CORS origin, allowing any");
                cors.allow_origin(Any)
            }
        },
    };

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Catering Operations Platform API v1.0"
}
