//! JWT authentication gate for protected routes.
//!
//! Dual-token system: a short-lived access token (1 min) sent as a bearer
//! header, and a long-lived refresh token held in an HTTP-only cookie. When
//! the access token has expired the gate silently mints a new one from the
//! refresh token and hands it to the handler, which echoes it back to the
//! client as `newAccessToken`. Nothing is stored server-side.

mod cookie;
mod errors;
mod extractors;
mod state;
mod types;

pub use cookie::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::{Auth, authenticate, bearer_token};
pub use state::HasAuthBackend;
pub use types::AuthGrant;
