//! Route paths.

pub const GET_HEALTH: &str = "/health";

pub const POST_AUTH_LOGIN: &str = "/auth/keycloak/login";
pub const POST_AUTH_REFRESH: &str = "/auth/keycloak/refresh";
pub const GET_AUTH_ME: &str = "/auth/keycloak/me";
pub const POST_AUTH_LOGOUT: &str = "/auth/keycloak/logout";

pub const TRUCKS: &str = "/camiones";
pub const TRUCKS_ID: &str = "/camiones/{id}";
pub const STRUCTURES: &str = "/estructura";
pub const STRUCTURES_ID: &str = "/estructura/{id}";
pub const PALLETS: &str = "/pallets";
pub const PALLETS_ID: &str = "/pallets/{id}";
pub const GET_PANELS_SN: &str = "/paneles/{sn}";
