//! Storefront API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod audit;
mod dto;
mod error;
mod handlers;
mod middleware;
mod request_context;
mod state;

use std::net::SocketAddr;

use axum::http::StatusCode;
use storefront_application::AuditLogInput;
use storefront_core::AppError;
use storefront_domain::AuditAction;
use tracing::info;

use crate::api_config::{ApiConfig, BootstrapAdmin, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{build_app_state, connect_and_migrate, spawn_rate_limit_sweeper};
use crate::request_context::RequestContext;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let pool = connect_and_migrate(&config.database_url).await?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let app_state = build_app_state(pool, &config)?;

    if let Some(admin) = &config.bootstrap_admin {
        ensure_bootstrap_admin(&app_state, admin).await?;
    }

    spawn_rate_limit_sweeper(
        app_state.rate_limit_service.clone(),
        config.rate_limit_sweep_interval,
    );

    let rule = app_state.rate_limit_service.rule();
    let app = build_router(app_state, &config.frontend_urls)?;
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(
        %address,
        window_ms = rule.window_ms(),
        max_requests = rule.max_requests(),
        store = ?config.rate_limit_store,
        "storefront api listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("api server failed: {error}")))
}

async fn ensure_bootstrap_admin(state: &AppState, admin: &BootstrapAdmin) -> Result<(), AppError> {
    let Some(user) = state
        .user_service
        .ensure_admin(&admin.username, &admin.password)
        .await?
    else {
        info!(username = %admin.username, "bootstrap admin already exists");
        return Ok(());
    };

    audit::record(
        state,
        &RequestContext::default(),
        AuditLogInput::success(AuditAction::UserCreated, StatusCode::CREATED.as_u16())
            .with_user(Some(user.id), user.username.clone())
            .with_details(serde_json::json!({ "source": "bootstrap", "roles": user.roles })),
    )
    .await;
    info!(username = %user.username, "bootstrap admin created");
    Ok(())
}
