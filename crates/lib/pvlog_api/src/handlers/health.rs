//! Liveness endpoint.

use axum::Json;

use crate::models::OkResponse;

/// `GET /health`
pub async fn health_handler() -> Json<OkResponse> {
    Json(OkResponse::ok())
}
