//! Route definitions for the Catering Operations Platform

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/inventory", inventory_routes())
        .nest("/purchases", purchase_routes())
        .nest("/orders", order_routes())
        .nest("/menu-items", menu_routes())
        .nest("/payments", payment_routes())
        .nest("/roles", role_routes())
        .nest("/staff", staff_routes())
        .nest("/suppliers", supplier_routes())
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/search", get(handlers::search))
        .route("/dashboard/stats", get(handlers::get_dashboard_stats))
        .route("/reports/profit", get(handlers::get_profit_report))
        .route("/auth/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Processor webhook (public, signature checked in the handler)
        .route("/payments/webhook", post(handlers::handle_webhook))
        .merge(protected)
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/oauth/url", get(handlers::oauth_url))
        .route("/oauth/callback", get(handlers::oauth_callback))
}

fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/low-stock", get(handlers::low_stock))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/:item_id/stock", put(handlers::adjust_stock))
        .route("/:item_id/movements", get(handlers::list_movements))
}

fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchases).post(handlers::create_purchase),
        )
        .route(
            "/:purchase_id",
            get(handlers::get_purchase).put(handlers::update_purchase),
        )
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order).put(handlers::update_order),
        )
}

fn menu_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_menu_items).post(handlers::create_menu_item),
        )
        .route(
            "/:menu_item_id",
            get(handlers::get_menu_item)
                .put(handlers::update_menu_item)
                .delete(handlers::delete_menu_item),
        )
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_payments))
        .route("/intents", post(handlers::create_intent))
        .route("/:payment_id/confirm", post(handlers::confirm_payment))
        .route("/:payment_id/refund", post(handlers::refund_payment))
}

fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_roles).post(handlers::create_role))
        .route(
            "/:role_id",
            get(handlers::get_role).put(handlers::update_role),
        )
}

fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_staff).post(handlers::create_staff))
        .route(
            "/:staff_id",
            get(handlers::get_staff)
                .put(handlers::update_staff)
                .delete(handlers::delete_staff),
        )
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route("/:supplier_id", delete(handlers::delete_supplier))
}
