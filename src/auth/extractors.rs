//! The auth gate: bearer access token with silent refresh from the cookie.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::{debug, error, warn};

use super::cookie::{REFRESH_COOKIE_NAME, get_cookie};
use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthBackend;
use super::types::AuthGrant;
use crate::jwt::JwtConfig;

/// Extract the token from an `Authorization: Bearer <token>` header.
/// Any other scheme, or an empty token, counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Core authentication logic.
///
/// 1. A valid access token authorizes immediately; the refresh cookie is not read.
/// 2. An access token that is invalid for any reason other than expiry is rejected.
/// 3. A missing or expired access token falls through to the refresh cookie,
///    which, if valid, yields a newly minted access token for the same subject.
pub fn authenticate(
    jwt: &JwtConfig,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
) -> Result<AuthGrant, AuthErrorKind> {
    if let Some(access_token) = access_token {
        match jwt
            .validate_access_token(access_token)
            .and_then(|claims| claims.user_id())
        {
            Ok(user_id) => {
                return Ok(AuthGrant {
                    user_id,
                    renewed_access_token: None,
                });
            }
            Err(e) if e.is_expired() => {
                debug!("Access token expired, trying refresh token");
            }
            Err(e) => {
                warn!(error = %e, "Rejected access token");
                return Err(AuthErrorKind::InvalidToken);
            }
        }
    }

    let refresh_token = refresh_token.ok_or(AuthErrorKind::NoRefreshToken)?;

    let user_id = jwt
        .validate_refresh_token(refresh_token)
        .and_then(|claims| claims.user_id())
        .map_err(|e| {
            warn!(error = %e, "Rejected refresh token");
            AuthErrorKind::InvalidRefreshToken
        })?;

    let access = jwt.generate_access_token(user_id).map_err(|e| {
        error!(user_id, error = %e, "Failed to generate access token");
        AuthErrorKind::Internal
    })?;

    debug!(user_id, "Renewed access token");

    Ok(AuthGrant {
        user_id,
        renewed_access_token: Some(access.token),
    })
}

/// Extractor for endpoints that require authentication.
/// Runs the gate on the request headers and hands the handler an `AuthGrant`.
/// Returns JSON errors; the handler never runs on rejection.
pub struct Auth(pub AuthGrant);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let access_token = bearer_token(&parts.headers);
        let refresh_token = get_cookie(&parts.headers, REFRESH_COOKIE_NAME);

        authenticate(state.jwt(), access_token, refresh_token)
            .map(Auth)
            .map_err(|kind| ApiAuthError::new(kind, state.secure_cookies()))
    }
}
