mod auth;
mod error;
mod posts;
mod response;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

pub use auth::AuthState;
pub use error::{ApiError, ResultExt, parse_id};
pub use posts::PostsState;
pub use response::ApiResponse;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    secure_cookies: bool,
    rate_limit_config: Arc<RateLimitConfig>,
) -> Router {
    let posts_state = posts::PostsState {
        db: db.clone(),
        jwt: jwt.clone(),
        secure_cookies,
    };

    let auth_state = auth::AuthState {
        db,
        jwt,
        secure_cookies,
        rate_limit_config,
    };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .nest("/posts", posts::router(posts_state))
}
