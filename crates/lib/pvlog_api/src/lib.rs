//! # pvlog_api
//!
//! HTTP API library for the PV logistics backend.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use pvlog_core::auth::SessionResolver;
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, logistics};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// Login, refresh and profile resolution.
    pub sessions: Arc<SessionResolver>,
    /// API configuration.
    pub config: ApiConfig,
}

/// Run embedded database migrations.
///
/// Delegates to `pvlog_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    pvlog_core::migrate::migrate(pool).await
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let config = config.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| config.origin_allowed(o))
                .unwrap_or(false)
        }))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler))
        .route(
            routes::TRUCKS,
            get(logistics::list_trucks_handler).post(logistics::create_truck_handler),
        )
        .route(
            routes::TRUCKS_ID,
            get(logistics::get_truck_handler)
                .put(logistics::update_truck_handler)
                .delete(logistics::delete_truck_handler),
        )
        .route(
            routes::STRUCTURES,
            get(logistics::list_structures_handler).post(logistics::create_structure_handler),
        )
        .route(
            routes::STRUCTURES_ID,
            get(logistics::get_structure_handler)
                .put(logistics::update_structure_handler)
                .delete(logistics::delete_structure_handler),
        )
        .route(
            routes::PALLETS,
            get(logistics::list_pallets_handler).post(logistics::create_pallet_handler),
        )
        .route(
            routes::PALLETS_ID,
            get(logistics::get_pallet_handler)
                .put(logistics::update_pallet_handler)
                .delete(logistics::delete_pallet_handler),
        )
        .route(routes::GET_PANELS_SN, get(logistics::get_panel_handler));

    // Protected routes (require a bearer token)
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .layer(axum::middleware::from_fn(middleware::auth::require_bearer));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
