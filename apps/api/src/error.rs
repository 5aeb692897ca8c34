use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use storefront_core::AppError;

const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please wait before making more requests.";
const INTERNAL_MESSAGE: &str = "Internal server error";

/// API error payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    window: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_requests: Option<u32>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

/// HTTP status for an application error.
pub fn status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) | AppError::OutOfStock(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message safe to show a client. Internal details never leave the process.
pub fn public_message(error: &AppError) -> String {
    match error {
        AppError::Validation(message)
        | AppError::OutOfStock(message)
        | AppError::Unauthorized(message)
        | AppError::Forbidden(message)
        | AppError::NotFound(message)
        | AppError::Conflict(message) => message.clone(),
        AppError::RateLimited { .. } => RATE_LIMITED_MESSAGE.to_owned(),
        AppError::Internal(_) => INTERNAL_MESSAGE.to_owned(),
    }
}

/// Formats a window length the way clients expect it, e.g. `900s`.
pub fn window_label(window_ms: u64) -> String {
    format!("{}s", window_ms as f64 / 1000.0)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let AppError::Internal(detail) = &self.0 {
            tracing::error!(error = %detail, "request failed");
        }

        let (window, max_requests) = match &self.0 {
            AppError::RateLimited {
                window_ms,
                max_requests,
            } => (Some(window_label(*window_ms)), Some(*max_requests)),
            _ => (None, None),
        };

        let payload = Json(ErrorResponse {
            error: public_message(&self.0),
            window,
            max_requests,
        });

        (status_code(&self.0), payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use storefront_core::AppError;

    use super::{public_message, status_code, window_label};

    #[test]
    fn errors_map_to_expected_statuses() {
        let cases = [
            (AppError::Validation("x".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::OutOfStock("x".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("x".to_owned()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".to_owned()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".to_owned()), StatusCode::CONFLICT),
            (
                AppError::RateLimited {
                    window_ms: 1,
                    max_requests: 1,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (AppError::Internal("x".to_owned()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(status_code(&error), expected);
        }
    }

    #[test]
    fn internal_detail_is_hidden() {
        let message = public_message(&AppError::Internal("connection refused".to_owned()));
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn window_label_uses_seconds() {
        assert_eq!(window_label(900_000), "900s");
        assert_eq!(window_label(1_500), "1.5s");
    }
}
