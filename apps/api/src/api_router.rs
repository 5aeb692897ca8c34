mod cors;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use storefront_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

use self::cors::build_cors_layer;

pub fn build_router(app_state: AppState, frontend_urls: &[String]) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/products",
            get(handlers::products::list_products_handler)
                .post(handlers::products::create_product_handler),
        )
        .route(
            "/api/products/{product_id}",
            get(handlers::products::get_product_handler)
                .delete(handlers::products::delete_product_handler),
        )
        .route(
            "/api/orders",
            get(handlers::orders::list_orders_handler).post(handlers::orders::create_order_handler),
        )
        .route(
            "/api/orders/{order_id}",
            delete(handlers::orders::delete_order_handler),
        )
        .route("/api/users", get(handlers::users::list_users_handler))
        .route(
            "/api/audit-logs",
            get(handlers::audit_logs::list_audit_logs_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/signup", post(handlers::auth::signup_handler))
        .route("/auth/login", post(handlers::auth::login_handler));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(from_fn_with_state(app_state.clone(), middleware::rate_limit))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_urls)?)
        .with_state(app_state))
}
