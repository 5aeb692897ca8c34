mod checks;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;

use crate::dto::{HealthChecks, HealthResponse};
use crate::state::AppState;

use self::checks::check_postgres;

/// Liveness and database readiness. Never rate limited.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = check_postgres(state.postgres_pool.clone()).await;

    let healthy = database.status != "error";
    let (status, http_status) = if healthy {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            timestamp: Utc::now(),
            uptime: state.started_at.elapsed().as_secs_f64(),
            checks: HealthChecks { database },
        }),
    )
}
