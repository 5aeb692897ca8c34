use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use storefront_application::RateLimitKey;
use storefront_core::AppError;
use tracing::warn;

use crate::error::ApiResult;
use crate::request_context::extract_request_context;
use crate::state::AppState;

const HEALTH_PATH: &str = "/health";

/// Counts every request against its caller's bucket and rejects it with 429
/// once the quota is spent. Pre-flight requests and health checks bypass the
/// limiter entirely.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_exempt(request.method(), request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| *address);
    let context = extract_request_context(request.headers(), peer);
    let key = RateLimitKey::for_request(
        bearer_credential(request.headers()),
        context.ip_address.as_deref(),
    );

    if let Err(error) = state.rate_limit_service.admit(&key).await {
        if matches!(error, AppError::RateLimited { .. }) {
            warn!(
                scope = key.scope(),
                path = %request.uri().path(),
                "rate limit exceeded"
            );
        }
        return Err(error.into());
    }

    Ok(next.run(request).await)
}

/// Resolves the bearer token into a `UserIdentity` request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_credential(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Authorization header missing".to_owned()))?;
    let identity = state.user_service.authenticate(token)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Returns the credential of an `Authorization: Bearer <token>` header. The
/// scheme is matched case-insensitively.
pub fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, credential) = value.split_once(' ')?;
    let credential = credential.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !credential.is_empty()).then_some(credential)
}

fn is_exempt(method: &Method, path: &str) -> bool {
    *method == Method::OPTIONS || path == HEALTH_PATH
}
