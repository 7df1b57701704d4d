//! PV logistics API server binary.
//!
//! Reads its configuration from flags or the environment (a `.env` file is
//! loaded first), runs the database migrations and serves the API.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pvlog_api::config::ApiConfig;
use pvlog_core::auth::{AuthMode, IdentityGateway, KeycloakConfig, SessionResolver};
use pvlog_core::users::PgUserStore;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use url::Url;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "pvlog_server", about = "PV logistics API server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8787)]
    port: u16,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/pvlog"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Keycloak server root.
    #[arg(long, env = "KEYCLOAK_BASE_URL", default_value = "http://localhost:8080")]
    keycloak_base_url: Url,

    #[arg(long, env = "KEYCLOAK_REALM", default_value = "master")]
    keycloak_realm: String,

    #[arg(long, env = "KEYCLOAK_CLIENT_ID", default_value = "fotovoltaica-client")]
    keycloak_client_id: String,

    /// Only needed for confidential clients.
    #[arg(long, env = "KEYCLOAK_CLIENT_SECRET", hide_env_values = true)]
    keycloak_client_secret: Option<String>,

    /// Timeout for every call to Keycloak, in seconds.
    #[arg(long, env = "KEYCLOAK_TIMEOUT_SECS", default_value_t = 5)]
    provider_timeout_secs: u64,

    /// Accept the fixed demonstration accounts and their mock tokens.
    #[arg(long, env = "ENABLE_DEV_AUTH", default_value_t = false)]
    enable_dev_auth: bool,

    /// Extra CORS origins, comma separated. Local origins are always allowed.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pvlog_api=debug,pvlog_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut keycloak = KeycloakConfig::new(
        args.keycloak_base_url,
        args.keycloak_realm,
        args.keycloak_client_id,
    );
    keycloak.client_secret = args.keycloak_client_secret;
    keycloak.timeout = Duration::from_secs(args.provider_timeout_secs);

    let mode = AuthMode::from_dev_flag(args.enable_dev_auth);

    info!(
        port = args.port,
        host = %args.host,
        max_connections = args.max_connections,
        ?mode,
        ?keycloak,
        "starting pvlog_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    pvlog_api::migrate(&pool).await?;

    let gateway = Arc::new(IdentityGateway::new(keycloak)?);
    let users = Arc::new(PgUserStore::new(pool.clone()));
    let sessions = Arc::new(SessionResolver::new(mode, gateway, users));

    let mut config = ApiConfig::new(format!("{}:{}", args.host, args.port));
    config.allowed_origins.extend(args.cors_origins);

    let state = pvlog_api::AppState {
        pool,
        sessions,
        config: config.clone(),
    };

    let app = pvlog_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
