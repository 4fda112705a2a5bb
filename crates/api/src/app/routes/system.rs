use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use epm_auth::Identity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(identity): Extension<Identity>) -> impl IntoResponse {
    Json(serde_json::json!({
        "employee_number": identity.employee_number(),
        "is_admin": identity.is_admin(),
    }))
}
