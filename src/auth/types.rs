//! Authentication result types.

/// Identity resolved by the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    /// Database user ID taken from the token subject
    pub user_id: i64,
    /// Freshly minted access token, set only when the gate renewed an expired one.
    /// Handlers must echo it back as `newAccessToken`.
    pub renewed_access_token: Option<String>,
}
