//! Authentication error types.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::cookie::clear_refresh_cookie;

/// Why the gate rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Bearer token is malformed or has a bad signature
    InvalidToken,
    /// Access token missing or expired and no refresh cookie was sent
    NoRefreshToken,
    /// Refresh cookie failed verification, including expiry
    InvalidRefreshToken,
    /// A renewed access token could not be minted
    Internal,
}

impl AuthErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthErrorKind::InvalidToken
            | AuthErrorKind::NoRefreshToken
            | AuthErrorKind::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AuthErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthErrorKind::InvalidToken => "Invalid token",
            AuthErrorKind::NoRefreshToken => "No refresh token",
            AuthErrorKind::InvalidRefreshToken => "Invalid refresh token, re-authenticate",
            AuthErrorKind::Internal => "Failed to renew access token",
        }
    }
}

/// API authentication error (JSON body, clears a refresh cookie that failed verification).
#[derive(Debug)]
pub struct ApiAuthError {
    pub kind: AuthErrorKind,
    secure_cookies: bool,
}

impl ApiAuthError {
    pub(super) fn new(kind: AuthErrorKind, secure_cookies: bool) -> Self {
        Self {
            kind,
            secure_cookies,
        }
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        use axum::Json;
        use serde::Serialize;

        #[derive(Serialize)]
        struct ErrorResponse {
            success: bool,
            message: &'static str,
        }

        let mut response = (
            self.kind.status_code(),
            Json(ErrorResponse {
                success: false,
                message: self.kind.message(),
            }),
        )
            .into_response();

        // Clear the cookie that failed verification
        if self.kind == AuthErrorKind::InvalidRefreshToken {
            if let Ok(value) = HeaderValue::from_str(&clear_refresh_cookie(self.secure_cookies)) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }

        response
    }
}
