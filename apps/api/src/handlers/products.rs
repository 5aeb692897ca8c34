use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use serde_json::json;
use storefront_application::{AuditLogInput, CreateProductInput};
use storefront_core::UserIdentity;
use storefront_domain::{AuditAction, ProductId};

use crate::audit;
use crate::dto::{
    CreateProductRequest, CreatedResponse, DataResponse, MessageResponse, ProductResponse,
    ProductSummaryResponse,
};
use crate::error::ApiResult;
use crate::request_context::RequestContext;
use crate::state::AppState;

pub async fn list_products_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<DataResponse<Vec<ProductResponse>>>> {
    let products = state
        .product_service
        .list_products()
        .await?
        .into_iter()
        .map(ProductResponse::from)
        .collect();

    Ok(Json(DataResponse { data: products }))
}

pub async fn get_product_handler(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<DataResponse<ProductSummaryResponse>>> {
    let product_id = ProductId::from_str(&product_id)?;
    let product = state.product_service.get_product(product_id).await?;

    Ok(Json(DataResponse {
        data: ProductSummaryResponse::from(product),
    }))
}

pub async fn create_product_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    context: RequestContext,
    Json(payload): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse<ProductResponse>>)> {
    let result = state
        .product_service
        .create_product(
            &user,
            CreateProductInput {
                name: payload.name,
                price: payload.price,
                stock: payload.stock,
            },
        )
        .await;

    let product = match result {
        Ok(product) => product,
        Err(error) => {
            audit::record_failure(
                &state,
                &context,
                Some(&user),
                AuditAction::ProductCreated,
                &error,
            )
            .await;
            return Err(error.into());
        }
    };

    audit::record(
        &state,
        &context,
        AuditLogInput::success(AuditAction::ProductCreated, StatusCode::CREATED.as_u16())
            .with_actor(&user)
            .with_details(json!({
                "productId": product.id.to_string(),
                "name": product.name,
                "price": product.price,
                "stock": product.stock,
            })),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Product created",
            data: ProductResponse::from(product),
        }),
    ))
}

pub async fn delete_product_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    context: RequestContext,
    Path(product_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let product_id = ProductId::from_str(&product_id)?;

    let existed = match state.product_service.delete_product(&user, product_id).await {
        Ok(existed) => existed,
        Err(error) => {
            audit::record_failure(
                &state,
                &context,
                Some(&user),
                AuditAction::ProductDeleted,
                &error,
            )
            .await;
            return Err(error.into());
        }
    };

    audit::record(
        &state,
        &context,
        AuditLogInput::success(AuditAction::ProductDeleted, StatusCode::OK.as_u16())
            .with_actor(&user)
            .with_details(json!({
                "productId": product_id.to_string(),
                "existed": existed,
            })),
    )
    .await;

    Ok(Json(MessageResponse {
        message: "Product deleted",
    }))
}
