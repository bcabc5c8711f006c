//! JWT token generation and validation.
//!
//! Access and refresh tokens are signed with separate secrets, so a leaked
//! refresh secret cannot be used to forge access tokens and vice versa.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token (1 minute), sent as a bearer header
    Access,
    /// Long-lived refresh token, sent only as an HTTP-only cookie
    Refresh,
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID as a decimal string)
    pub sub: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (user ID as a decimal string)
    pub sub: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl AccessClaims {
    /// Parse the subject back into a user ID.
    pub fn user_id(&self) -> Result<i64, JwtError> {
        parse_subject(&self.sub)
    }
}

impl RefreshClaims {
    /// Parse the subject back into a user ID.
    pub fn user_id(&self) -> Result<i64, JwtError> {
        parse_subject(&self.sub)
    }
}

fn parse_subject(sub: &str) -> Result<i64, JwtError> {
    sub.parse().map_err(|_| JwtError::InvalidSubject)
}

/// Access token duration: 1 minute
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 60;

/// Default refresh token duration: 7 days
pub const DEFAULT_REFRESH_TOKEN_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    refresh_duration: u64,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    /// The JWT token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Result of generating a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenResult {
    /// The JWT token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Both tokens minted for a successful login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: AccessTokenResult,
    pub refresh: RefreshTokenResult,
}

impl JwtConfig {
    /// Create a new JWT configuration.
    ///
    /// The two secrets must differ and the refresh duration must be strictly
    /// longer than the access token duration.
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        refresh_duration: u64,
    ) -> Result<Self, JwtError> {
        if access_secret == refresh_secret {
            return Err(JwtError::SharedSecret);
        }
        if refresh_duration <= ACCESS_TOKEN_DURATION_SECS {
            return Err(JwtError::RefreshTooShort);
        }

        Ok(Self {
            access_encoding_key: EncodingKey::from_secret(access_secret),
            access_decoding_key: DecodingKey::from_secret(access_secret),
            refresh_encoding_key: EncodingKey::from_secret(refresh_secret),
            refresh_decoding_key: DecodingKey::from_secret(refresh_secret),
            refresh_duration,
        })
    }

    /// Mint an access token and a refresh token for the same user.
    pub fn issue(&self, user_id: i64) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access: self.generate_access_token(user_id)?,
            refresh: self.generate_refresh_token(user_id)?,
        })
    }

    /// Generate a short-lived access token for a user.
    pub fn generate_access_token(&self, user_id: i64) -> Result<AccessTokenResult, JwtError> {
        let now = unix_now()?;

        let claims = AccessClaims {
            sub: user_id.to_string(),
            token_type: TokenType::Access,
            iat: now,
            exp: now + ACCESS_TOKEN_DURATION_SECS,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.access_encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(AccessTokenResult {
            token,
            duration: ACCESS_TOKEN_DURATION_SECS,
        })
    }

    /// Generate a refresh token for a user.
    pub fn generate_refresh_token(&self, user_id: i64) -> Result<RefreshTokenResult, JwtError> {
        let now = unix_now()?;
        let exp = now + self.refresh_duration;

        let claims = RefreshClaims {
            sub: user_id.to_string(),
            token_type: TokenType::Refresh,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.refresh_encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(RefreshTokenResult {
            token,
            duration: self.refresh_duration,
        })
    }

    /// Validate and decode an access token.
    /// An expired but otherwise valid token yields `JwtError::Expired`.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let token_data = jsonwebtoken::decode::<AccessClaims>(
            token,
            &self.access_decoding_key,
            &strict_validation(),
        )
        .map_err(JwtError::from_decode)?;

        if token_data.claims.token_type != TokenType::Access {
            return Err(JwtError::WrongTokenType);
        }
        token_data.claims.user_id()?;

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        let token_data = jsonwebtoken::decode::<RefreshClaims>(
            token,
            &self.refresh_decoding_key,
            &strict_validation(),
        )
        .map_err(JwtError::from_decode)?;

        if token_data.claims.token_type != TokenType::Refresh {
            return Err(JwtError::WrongTokenType);
        }
        token_data.claims.user_id()?;

        Ok(token_data.claims)
    }
}

fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

fn unix_now() -> Result<u64, JwtError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| JwtError::TimeError)?
        .as_secs())
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Signature and structure are fine but the token is past its expiry
    Expired,
    /// Bad signature, malformed token, or any other decoding failure
    Decoding(jsonwebtoken::errors::Error),
    /// Subject is not a user ID
    InvalidSubject,
    /// System time error
    TimeError,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
    /// Access and refresh secrets are identical
    SharedSecret,
    /// Refresh duration is not longer than the access token duration
    RefreshTooShort,
}

impl JwtError {
    fn from_decode(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Decoding(e),
        }
    }

    /// True if the token only failed because it expired.
    pub fn is_expired(&self) -> bool {
        matches!(self, JwtError::Expired)
    }
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Expired => write!(f, "Token has expired"),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::InvalidSubject => write!(f, "Token subject is not a user ID"),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
            JwtError::SharedSecret => {
                write!(f, "Access and refresh token secrets must be different")
            }
            JwtError::RefreshTooShort => write!(
                f,
                "Refresh token lifetime must be longer than {} seconds",
                ACCESS_TOKEN_DURATION_SECS
            ),
        }
    }
}

impl std::error::Error for JwtError {}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &[u8] = b"test-access-secret-for-testing";
    const REFRESH_SECRET: &[u8] = b"test-refresh-secret-for-testing";

    fn config() -> JwtConfig {
        JwtConfig::new(ACCESS_SECRET, REFRESH_SECRET, 120).unwrap()
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[test]
    fn test_issue_binds_both_tokens_to_user() {
        let config = config();

        for user_id in [1, 42, i64::MAX] {
            let pair = config.issue(user_id).unwrap();

            let access = config.validate_access_token(&pair.access.token).unwrap();
            let refresh = config.validate_refresh_token(&pair.refresh.token).unwrap();

            assert_eq!(access.user_id().unwrap(), user_id);
            assert_eq!(refresh.user_id().unwrap(), user_id);
            assert_eq!(access.token_type, TokenType::Access);
            assert_eq!(refresh.token_type, TokenType::Refresh);
        }
    }

    #[test]
    fn test_durations() {
        let config = config();
        let pair = config.issue(7).unwrap();

        assert_eq!(pair.access.duration, ACCESS_TOKEN_DURATION_SECS);
        assert_eq!(pair.refresh.duration, 120);
        assert!(pair.refresh.duration > pair.access.duration);

        let claims = config.validate_access_token(&pair.access.token).unwrap();
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_DURATION_SECS);
    }

    #[test]
    fn test_tokens_do_not_cross_secrets() {
        let config = config();
        let pair = config.issue(1).unwrap();

        assert!(config.validate_refresh_token(&pair.access.token).is_err());
        assert!(config.validate_access_token(&pair.refresh.token).is_err());
    }

    #[test]
    fn test_same_type_signed_with_other_secret_rejected() {
        // Token type is correct, only the signing secret differs.
        let now = now();
        let forged = AccessClaims {
            sub: "1".to_string(),
            token_type: TokenType::Access,
            iat: now,
            exp: now + 60,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &forged,
            &EncodingKey::from_secret(REFRESH_SECRET),
        )
        .unwrap();

        let result = config().validate_access_token(&token);
        assert!(matches!(result, Err(JwtError::Decoding(_))));
    }

    #[test]
    fn test_invalid_token() {
        let result = config().validate_access_token("invalid-token");
        assert!(matches!(result, Err(JwtError::Decoding(_))));
    }

    #[test]
    fn test_expired_token_reports_expiry() {
        let now = now();
        let claims = AccessClaims {
            sub: "1".to_string(),
            token_type: TokenType::Access,
            iat: now - 100,
            exp: now - 50,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(ACCESS_SECRET),
        )
        .unwrap();

        let err = config().validate_access_token(&token).unwrap_err();
        assert!(err.is_expired());
    }

    #[test]
    fn test_expired_token_with_bad_signature_is_not_expiry() {
        let now = now();
        let claims = AccessClaims {
            sub: "1".to_string(),
            token_type: TokenType::Access,
            iat: now - 100,
            exp: now - 50,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"someone-elses-secret"),
        )
        .unwrap();

        let err = config().validate_access_token(&token).unwrap_err();
        assert!(!err.is_expired());
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let now = now();
        let claims = AccessClaims {
            sub: "alice".to_string(),
            token_type: TokenType::Access,
            iat: now,
            exp: now + 60,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(ACCESS_SECRET),
        )
        .unwrap();

        let result = config().validate_access_token(&token);
        assert!(matches!(result, Err(JwtError::InvalidSubject)));
    }

    #[test]
    fn test_shared_secret_rejected() {
        let result = JwtConfig::new(b"same-secret", b"same-secret", 120);
        assert!(matches!(result, Err(JwtError::SharedSecret)));
    }

    #[test]
    fn test_refresh_must_outlive_access() {
        let result = JwtConfig::new(ACCESS_SECRET, REFRESH_SECRET, ACCESS_TOKEN_DURATION_SECS);
        assert!(matches!(result, Err(JwtError::RefreshTooShort)));

        assert!(JwtConfig::new(ACCESS_SECRET, REFRESH_SECRET, ACCESS_TOKEN_DURATION_SECS + 1).is_ok());
    }
}
