//! Signup, login and logout.
//!
//! - POST `/signup` - Create an account
//! - POST `/login` - Verify credentials, return an access token and set the refresh cookie
//! - POST `/logout` - Clear the refresh cookie

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::SET_COOKIE},
    middleware,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ApiError, ResultExt};
use super::response::ApiResponse;
use crate::auth::{clear_refresh_cookie, refresh_cookie};
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::password::{hash_password, verify_password};
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_signup};

const MAX_NAME_LENGTH: usize = 255;
const MAX_EMAIL_LENGTH: usize = 255;
const MAX_PASSWORD_LENGTH: usize = 1024;

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

pub fn router(state: AuthState) -> Router {
    let signup_router = Router::new()
        .route("/signup", post(signup))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_signup,
        ));

    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_login,
        ));

    Router::new()
        .route("/logout", post(logout))
        .with_state(state)
        .merge(signup_router)
        .merge(login_router)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SignupRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Serialize)]
struct SignupResponse {
    id: i64,
    name: String,
    email: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    message: &'static str,
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("Password cannot be empty"));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password cannot be longer than {} bytes",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

async fn signup(
    State(state): State<AuthState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let name = payload.name.trim();
    let email = payload.email.trim();

    if name.is_empty() {
        return Err(ApiError::validation("Name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::validation(format!(
            "Name cannot be longer than {} characters",
            MAX_NAME_LENGTH
        )));
    }
    if email.len() > MAX_EMAIL_LENGTH || !is_valid_email(email) {
        return Err(ApiError::validation("Invalid email address"));
    }
    validate_password(&payload.password)?;

    let existing = state
        .db
        .users()
        .get_by_email(email)
        .await
        .db_err("Failed to check email availability")?;
    if existing.is_some() {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let password_hash = hash_password(payload.password)
        .await
        .map_err(|e| ApiError::internal_error("Failed to hash password", e))?;

    let id = match state.db.users().create(name, email, &password_hash).await {
        Ok(id) => id,
        // Lost a race with a concurrent signup for the same address
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(ApiError::conflict("Email is already registered"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    };

    info!(user_id = id, email = %email, "User created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::message("User created successfully").with_data(SignupResponse {
            id,
            name: name.to_string(),
            email: email.to_string(),
        }),
    ))
}

async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let email = payload.email.trim();

    if !is_valid_email(email) {
        return Err(ApiError::validation("Invalid email address"));
    }

    let user = state
        .db
        .users()
        .get_by_email(email)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let valid = verify_password(user.password_hash, payload.password)
        .await
        .map_err(|e| ApiError::internal_error("Failed to verify password", e))?;
    if !valid {
        warn!(user_id = user.id, "Login failed: invalid password");
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let tokens = state
        .jwt
        .issue(user.id)
        .map_err(|e| ApiError::internal_error("Failed to issue tokens", e))?;

    info!(user_id = user.id, "Login successful");

    let cookie = refresh_cookie(
        &tokens.refresh.token,
        tokens.refresh.duration,
        state.secure_cookies,
    );

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            message: "Login successful",
            access_token: tokens.access.token,
        }),
    ))
}

/// Tokens are not tracked server-side, so logging out only removes the cookie.
/// Any access token already handed out stays valid until it expires.
async fn logout(State(state): State<AuthState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_refresh_cookie(state.secure_cookies))],
        ApiResponse::message("Logged out"),
    )
}
