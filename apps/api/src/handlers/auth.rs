use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use storefront_application::{AuditLogInput, AuthOutcome, SignupParams};
use storefront_core::AppError;
use storefront_domain::AuditAction;

use crate::audit;
use crate::dto::{CredentialsRequest, MessageResponse, TokenResponse};
use crate::error::ApiResult;
use crate::request_context::RequestContext;
use crate::state::AppState;

pub async fn signup_handler(
    State(state): State<AppState>,
    context: RequestContext,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let requested_username = payload.username.trim().to_owned();
    let result = state
        .user_service
        .signup(SignupParams {
            username: payload.username,
            password: payload.password,
        })
        .await;

    let user = match result {
        Ok(user) => user,
        Err(error) => {
            audit::record(
                &state,
                &context,
                audit::failure_input(AuditAction::UserSignup, &error)
                    .with_details(json!({ "username": requested_username })),
            )
            .await;
            return Err(error.into());
        }
    };

    audit::record(
        &state,
        &context,
        AuditLogInput::success(AuditAction::UserSignup, StatusCode::CREATED.as_u16())
            .with_user(Some(user.id), user.username.clone()),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully",
        }),
    ))
}

pub async fn login_handler(
    State(state): State<AppState>,
    context: RequestContext,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let username = payload.username.trim().to_owned();
    let outcome = state
        .user_service
        .login(&username, &payload.password)
        .await;

    let error = match outcome {
        Ok(AuthOutcome::Authenticated { token, identity }) => {
            audit::record(
                &state,
                &context,
                AuditLogInput::success(AuditAction::UserLogin, StatusCode::OK.as_u16())
                    .with_actor(&identity),
            )
            .await;
            return Ok(Json(TokenResponse { token }));
        }
        Ok(AuthOutcome::Failed) => AppError::Unauthorized("Invalid credentials".to_owned()),
        Err(error) => error,
    };

    audit::record(
        &state,
        &context,
        audit::failure_input(AuditAction::UserLoginFailed, &error)
            .with_details(json!({ "username": username })),
    )
    .await;
    Err(error.into())
}
