use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use serde_json::json;
use storefront_application::{AuditLogInput, CreateOrderInput};
use storefront_core::{AppResult, UserIdentity};
use storefront_domain::{AuditAction, OrderId, OrderStatus, ProductId};
use tracing::warn;

use crate::audit;
use crate::dto::{
    CreateOrderRequest, CreatedResponse, MessageResponse, OrderCreatedResponse,
    OrderListResponse, OrderResponse, UserIdentityResponse,
};
use crate::error::ApiResult;
use crate::request_context::RequestContext;
use crate::state::AppState;

pub async fn list_orders_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<OrderListResponse>> {
    let orders = state
        .order_service
        .list_orders(&user)
        .await?
        .into_iter()
        .map(OrderResponse::from)
        .collect();

    Ok(Json(OrderListResponse {
        data: orders,
        user: UserIdentityResponse::from(&user),
    }))
}

pub async fn create_order_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    context: RequestContext,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse<OrderCreatedResponse>>)> {
    let input = match parse_create_order(payload) {
        Ok(input) => input,
        Err(error) => {
            audit::record_failure(&state, &context, Some(&user), AuditAction::OrderCreated, &error)
                .await;
            return Err(error.into());
        }
    };

    let order = match state.order_service.create_order(&user, input).await {
        Ok(order) => order,
        Err(error) => {
            audit::record(
                &state,
                &context,
                audit::failure_input(AuditAction::OrderCreated, &error)
                    .with_actor(&user)
                    .with_details(json!({ "productId": input.product_id.to_string() })),
            )
            .await;
            return Err(error.into());
        }
    };

    audit::record(
        &state,
        &context,
        AuditLogInput::success(AuditAction::OrderCreated, StatusCode::CREATED.as_u16())
            .with_actor(&user)
            .with_details(json!({
                "orderId": order.id.to_string(),
                "orderNumber": order.order_number.as_str(),
                "productId": order.product_id.to_string(),
                "price": order.price,
            })),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Order created",
            data: OrderCreatedResponse::from(&order),
        }),
    ))
}

pub async fn delete_order_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    context: RequestContext,
    Path(order_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let order_id = OrderId::from_str(&order_id)?;

    let deletion = match state.order_service.delete_order(&user, order_id).await {
        Ok(deletion) => deletion,
        Err(error) => {
            audit::record_failure(&state, &context, Some(&user), AuditAction::OrderDeleted, &error)
                .await;
            return Err(error.into());
        }
    };

    if !deletion.restocked {
        warn!(
            order_number = %deletion.order.order_number,
            product_id = %deletion.order.product_id,
            "order deleted but its product no longer exists; unit not restocked"
        );
    }

    audit::record(
        &state,
        &context,
        AuditLogInput::success(AuditAction::OrderDeleted, StatusCode::OK.as_u16())
            .with_actor(&user)
            .with_details(json!({
                "orderId": deletion.order.id.to_string(),
                "orderNumber": deletion.order.order_number.as_str(),
                "productId": deletion.order.product_id.to_string(),
                "restocked": deletion.restocked,
            })),
    )
    .await;

    Ok(Json(MessageResponse {
        message: "Order deleted",
    }))
}

fn parse_create_order(payload: CreateOrderRequest) -> AppResult<CreateOrderInput> {
    Ok(CreateOrderInput {
        product_id: ProductId::from_str(&payload.product_id)?,
        status: payload
            .status
            .as_deref()
            .map(OrderStatus::from_str)
            .transpose()?,
    })
}
