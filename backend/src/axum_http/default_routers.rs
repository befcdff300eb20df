use axum::{
    Json,
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use serde::Serialize;
use tracing::info;

use super::error_responses::ErrorResponse;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// Unmatched routes answer in the same JSON shape as every other API error.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    info!(path = %uri.path(), "http: no route matched");
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            code: StatusCode::NOT_FOUND.as_u16(),
            message: format!("no route for {}", uri.path()),
        }),
    )
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
