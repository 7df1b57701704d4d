//! Authentication request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Extension, Form, Json};
use tracing::{debug, info};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AccessToken;
use crate::models::{LoginRequest, LogoutResponse, RefreshRequest, SessionResponse};

/// Login body read as JSON when the content type says so, as a urlencoded
/// form otherwise.
#[derive(Debug)]
pub struct LoginCredentials(pub LoginRequest);

impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let body = if is_json {
            Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?
                .0
        } else {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?
                .0
        };
        Ok(LoginCredentials(body))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `POST /auth/keycloak/login`: authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    LoginCredentials(body): LoginCredentials,
) -> AppResult<Json<SessionResponse>> {
    let (Some(username), Some(password)) = (non_empty(body.username), non_empty(body.password))
    else {
        return Err(AppError::Validation(
            "Username and password are required".into(),
        ));
    };

    debug!(%username, "login attempt");
    let envelope = state.sessions.login(&username, &password).await?;
    info!(user_id = envelope.user.id, "login ok");

    Ok(Json(SessionResponse::from_envelope(
        envelope,
        Some("Authentication successful"),
    )))
}

/// `POST /auth/keycloak/refresh`: exchange a refresh token for a new session.
pub async fn refresh_handler(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Json<SessionResponse>> {
    let refresh_token = body
        .ok()
        .and_then(|Json(b)| non_empty(b.refresh_token))
        .ok_or_else(|| AppError::Validation("Refresh token is required".into()))?;

    let envelope = state.sessions.refresh(&refresh_token).await?;
    Ok(Json(SessionResponse::from_envelope(
        envelope,
        Some("Token refreshed"),
    )))
}

/// `GET /auth/keycloak/me`: profile of the bearer of the access token.
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(AccessToken(token)): Extension<AccessToken>,
) -> AppResult<Json<SessionResponse>> {
    let envelope = state.sessions.profile(&token).await?;
    Ok(Json(SessionResponse::from_envelope(envelope, None)))
}

/// `POST /auth/keycloak/logout`: stateless, the client drops its tokens.
pub async fn logout_handler() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        success: true,
        message: "Logged out".into(),
    })
}
