//! Best-effort audit recording for handlers.

use serde_json::json;
use storefront_application::AuditLogInput;
use storefront_core::{AppError, UserIdentity};
use storefront_domain::AuditAction;
use tracing::{info, warn};

use crate::error::{public_message, status_code};
use crate::request_context::RequestContext;
use crate::state::AppState;

/// Persists an audit entry. Failures are logged and never reach the client.
pub async fn record(state: &AppState, context: &RequestContext, input: AuditLogInput) {
    let input = input.with_request(context.ip_address.clone(), context.user_agent.clone());
    let action = input.action;

    match state.audit_log_service.record(input).await {
        Ok(entry) => info!(
            action = %entry.action,
            success = entry.success,
            status = entry.status_code,
            "audit event recorded"
        ),
        Err(error) => warn!(action = %action, error = %error, "failed to record audit event"),
    }
}

/// Starts a failure record carrying the status and message the client sees.
pub fn failure_input(action: AuditAction, error: &AppError) -> AuditLogInput {
    AuditLogInput::failure(action, status_code(error).as_u16(), public_message(error))
}

/// Records a failed attempt at `action`. Role failures are recorded as
/// `UNAUTHORIZED_ACCESS` naming the attempted action.
pub async fn record_failure(
    state: &AppState,
    context: &RequestContext,
    actor: Option<&UserIdentity>,
    action: AuditAction,
    error: &AppError,
) {
    if matches!(error, AppError::Forbidden(_)) {
        record_denied(state, context, actor, action.as_str(), error).await;
        return;
    }

    let mut input = failure_input(action, error);
    if let Some(actor) = actor {
        input = input.with_actor(actor);
    }
    record(state, context, input).await;
}

/// Records role failures on operations that carry no audit action of their
/// own. Other errors are not recorded.
pub async fn record_denied(
    state: &AppState,
    context: &RequestContext,
    actor: Option<&UserIdentity>,
    attempted: &str,
    error: &AppError,
) {
    if !matches!(error, AppError::Forbidden(_)) {
        return;
    }

    let mut input = failure_input(AuditAction::UnauthorizedAccess, error)
        .with_details(json!({ "attemptedAction": attempted }));
    if let Some(actor) = actor {
        input = input.with_actor(actor);
    }
    record(state, context, input).await;
}
