use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use epm_infra::ServiceError;

/// Generic mapping for service errors that reach a JSON endpoint.
///
/// Form routes handle `Validation`, `Forbidden` and persistence failures
/// themselves (re-rendered view or redirect with a notice).
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", err.to_string())
        }
        ServiceError::DuplicateEmail
        | ServiceError::DuplicateUsername
        | ServiceError::DuplicateEmployeeNumber => {
            json_error(StatusCode::CONFLICT, "duplicate", err.to_string())
        }
        ServiceError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "validation_error",
                "errors": errors,
            })),
        )
            .into_response(),
        ServiceError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        ServiceError::Forbidden(action) => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("You do not have permission to {action} this review."),
        ),
        ServiceError::Persistence => internal_error(err),
    }
}

/// 500 without internal detail; the cause was already logged where it
/// became a [`ServiceError`].
pub fn internal_error(err: ServiceError) -> axum::response::Response {
    tracing::debug!(error = %err, "request failed");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        ServiceError::Persistence.to_string(),
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
