use axum::Json;
use axum::extract::{Extension, Query, State};
use storefront_application::ListAuditLogParams;
use storefront_core::UserIdentity;

use crate::audit;
use crate::dto::{AuditLogListResponse, AuditLogQueryParams};
use crate::error::ApiResult;
use crate::request_context::RequestContext;
use crate::state::AppState;

pub async fn list_audit_logs_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    context: RequestContext,
    Query(query): Query<AuditLogQueryParams>,
) -> ApiResult<Json<AuditLogListResponse>> {
    let params = ListAuditLogParams {
        limit: query.limit,
        offset: query.offset,
        action: query.action,
        user_id: query.user_id,
    };

    match state.audit_log_service.list(&user, params).await {
        Ok(page) => Ok(Json(AuditLogListResponse::from(page))),
        Err(error) => {
            audit::record_denied(&state, &context, Some(&user), "LIST_AUDIT_LOGS", &error).await;
            Err(error.into())
        }
    }
}
