//! API server configuration.

/// Frontend dev-server origins allowed by default.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
    "http://localhost:3000",
    "http://localhost:4173",
];

/// Configuration for the API router.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:8787").
    pub bind_addr: String,
    /// Origins allowed by CORS on top of any local origin.
    pub allowed_origins: Vec<String>,
}

impl ApiConfig {
    pub fn new(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
        }
    }

    /// Whether a browser origin may call the API: listed explicitly, or any
    /// origin on `localhost` / `127.0.0.1`.
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
            || origin.contains("localhost")
            || origin.contains("127.0.0.1")
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new("0.0.0.0:8787")
    }
}
