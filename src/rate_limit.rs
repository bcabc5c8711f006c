//! Rate limiting for authentication endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing and signup spam. Once a limiter tracks more than
//! `MAX_TRACKED_IPS` addresses, entries whose bucket has fully refilled are
//! dropped, so the map only holds clients seen within the last refill window.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
};
use tracing::warn;

use crate::api::ApiError;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Number of tracked addresses above which stale entries are pruned.
const MAX_TRACKED_IPS: usize = 10_000;

/// Check `ip` against the limiter, pruning idle addresses when the map is large.
fn check_ip<C: Clock>(
    limiter: &RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, C, NoOpMiddleware<C::Instant>>,
    ip: IpAddr,
    max_tracked: usize,
) -> bool {
    let allowed = limiter.check_key(&ip).is_ok();
    if limiter.len() > max_tracked {
        limiter.retain_recent();
    }
    allowed
}

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for login
    pub login: Arc<IpLimiter>,
    /// Per-IP limiter for signup
    pub signup: Arc<IpLimiter>,
}

impl RateLimitConfig {
    /// Create limiters allowing the given number of requests per minute per IP.
    pub fn new(login_per_minute: NonZeroU32, signup_per_minute: NonZeroU32) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(Quota::per_minute(login_per_minute))),
            signup: Arc::new(RateLimiter::keyed(Quota::per_minute(signup_per_minute))),
        }
    }
}

/// Middleware for rate limiting login.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if check_ip(&config.login, addr.ip(), MAX_TRACKED_IPS) {
        next.run(request).await
    } else {
        warn!(ip = %addr.ip(), "Login rate limit exceeded");
        ApiError::too_many_requests("Too many login attempts. Please wait before trying again.")
            .into_response()
    }
}

/// Middleware for rate limiting signup.
pub async fn rate_limit_signup(
    State(config): State<Arc<RateLimitConfig>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if check_ip(&config.signup, addr.ip(), MAX_TRACKED_IPS) {
        next.run(request).await
    } else {
        warn!(ip = %addr.ip(), "Signup rate limit exceeded");
        ApiError::too_many_requests("Too many signup attempts. Please wait before trying again.")
            .into_response()
    }
}
