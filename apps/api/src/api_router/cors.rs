use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use storefront_core::AppError;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub(super) fn build_cors_layer(frontend_urls: &[String]) -> Result<CorsLayer, AppError> {
    let origins = frontend_urls
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|error| {
                AppError::Validation(format!("invalid FRONTEND_URLS entry '{origin}': {error}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]))
}
