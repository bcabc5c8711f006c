pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;

use api::create_api_router;
use axum::{Router, routing::get};
use db::Database;
use jwt::JwtConfig;
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Signing keys and refresh lifetime for both token kinds
    pub jwt: JwtConfig,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Login attempts allowed per minute per client IP
    pub login_rate_limit: NonZeroU32,
    /// Signups allowed per minute per client IP
    pub signup_rate_limit: NonZeroU32,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(config.jwt.clone());
    let rate_limit_config = Arc::new(RateLimitConfig::new(
        config.login_rate_limit,
        config.signup_rate_limit,
    ));

    let api_router = create_api_router(
        config.db.clone(),
        jwt,
        config.secure_cookies,
        rate_limit_config,
    );

    Router::new()
        .route("/", get(|| async { "Hello from Quillpost!" }))
        .route("/api/v1", get(|| async { "Hello from API v1!" }))
        .nest("/api/v1", api_router)
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
