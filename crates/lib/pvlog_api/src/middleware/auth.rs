//! Bearer token extraction.

use axum::{extract::Request, middleware::Next, response::Response};
use axum::http::header::AUTHORIZATION;

use crate::error::AppError;

/// Raw access token taken from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

/// Axum middleware: requires `Authorization: Bearer <token>` and injects
/// [`AccessToken`] into request extensions. The token itself is verified by
/// the handler through the session resolver.
pub async fn require_bearer(mut request: Request, next: Next) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?
        .to_string();

    request.extensions_mut().insert(AccessToken(token));

    Ok(next.run(request).await)
}
