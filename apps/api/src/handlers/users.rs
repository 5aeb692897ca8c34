use axum::Json;
use axum::extract::{Extension, State};
use storefront_core::UserIdentity;

use crate::audit;
use crate::dto::{DataResponse, UserResponse};
use crate::error::ApiResult;
use crate::request_context::RequestContext;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    context: RequestContext,
) -> ApiResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = match state.user_service.list_users(&user).await {
        Ok(users) => users,
        Err(error) => {
            audit::record_denied(&state, &context, Some(&user), "LIST_USERS", &error).await;
            return Err(error.into());
        }
    };

    Ok(Json(DataResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
    }))
}
