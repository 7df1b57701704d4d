//! Logistics routes that are rejected before reaching the database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use pvlog_api::AppState;
use pvlog_api::config::ApiConfig;
use pvlog_core::auth::{AuthMode, IdentityGateway, KeycloakConfig, SessionResolver};
use pvlog_core::users::MemoryUserStore;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use url::Url;

fn router() -> Router {
    let kc = KeycloakConfig::new(Url::parse("http://127.0.0.1:9").unwrap(), "master", "client");
    let sessions = SessionResolver::new(
        AuthMode::Provider,
        Arc::new(IdentityGateway::new(kc).unwrap()),
        Arc::new(MemoryUserStore::new()),
    );
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost:1/unused")
        .unwrap();
    pvlog_api::router(AppState {
        pool,
        sessions: Arc::new(sessions),
        config: ApiConfig::default(),
    })
}

async fn status_and_body(req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = router().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (
        status,
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    )
}

#[tokio::test]
async fn non_numeric_ids_are_400() {
    for uri in ["/camiones/abc", "/estructura/1.5"] {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, json) = status_and_body(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["code"], "validation_error");
    }

    let req = Request::builder()
        .method("DELETE")
        .uri("/camiones/x")
        .body(Body::empty())
        .unwrap();
    assert_eq!(status_and_body(req).await.0, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("PUT")
        .uri("/estructura/x")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"Proveedor":"Acme"}"#))
        .unwrap();
    assert_eq!(status_and_body(req).await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pallet_without_id_is_400() {
    let req = Request::builder()
        .method("POST")
        .uri("/pallets")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"Descarga": 3, "Defecto": false}"#))
        .unwrap();
    let (status, json) = status_and_body(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Pallet id is required");
}

#[tokio::test]
async fn unreadable_bodies_get_the_json_error_body() {
    let cases = [
        ("POST", "/camiones", Some("application/json"), "{not json"),
        ("PUT", "/camiones/1", Some("application/json"), "{not json"),
        ("POST", "/pallets", Some("application/json"), "{not json"),
        ("POST", "/camiones", None, r#"{"Matricula":"1234-ABC"}"#),
        ("PUT", "/estructura/1", None, r#"{"Proveedor":"Acme"}"#),
        (
            "POST",
            "/camiones",
            Some("application/json"),
            r#"{"FechaDescarga":"2025-03-01"}"#,
        ),
    ];

    for (method, uri, content_type, body) in cases {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        let req = builder.body(Body::from(body)).unwrap();

        let (status, json) = status_and_body(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri} {body}");
        assert_eq!(json["code"], "validation_error", "{method} {uri} {body}");
        assert!(json["error"].is_string(), "{method} {uri} {body}");
    }
}
