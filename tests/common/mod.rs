#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{HeaderMap, Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header};
use quillpost::{
    ServerConfig, create_app,
    db::Database,
    jwt::{AccessClaims, JwtConfig, TokenType},
};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const ACCESS_SECRET: &[u8] = b"integration-access-secret-0123456789";
pub const REFRESH_SECRET: &[u8] = b"integration-refresh-secret-0123456789";
pub const PASSWORD: &str = "correct horse battery staple";

pub fn client_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40000))
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig::new(ACCESS_SECRET, REFRESH_SECRET, 3600).expect("Invalid JWT config")
}

/// Server config with rate limits high enough not to interfere.
pub fn test_config(db: Database) -> ServerConfig {
    ServerConfig {
        db,
        jwt: jwt_config(),
        secure_cookies: false,
        login_rate_limit: NonZeroU32::new(1000).expect("nonzero"),
        signup_rate_limit: NonZeroU32::new(1000).expect("nonzero"),
    }
}

/// Create a test app and return (app, db).
pub async fn create_test_app() -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let app = create_app(&test_config(db.clone())).layer(MockConnectInfo(client_addr()));
    (app, db)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: serde_json::Value,
}

impl TestResponse {
    /// The `Set-Cookie` value for the refresh token, if any.
    pub fn refresh_set_cookie(&self) -> Option<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("refresh_token="))
    }

    /// Just the refresh token out of the `Set-Cookie` header.
    pub fn refresh_token(&self) -> Option<String> {
        let cookie = self.refresh_set_cookie()?;
        let value = cookie.strip_prefix("refresh_token=")?;
        let token = value.split(';').next()?;
        (!token.is_empty()).then(|| token.to_string())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    TestResponse {
        status,
        headers,
        json,
    }
}

/// Build a request with an optional JSON body, bearer token and refresh cookie.
pub fn request(
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = access_token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(token) = refresh_token {
        builder = builder.header(header::COOKIE, format!("refresh_token={}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn signup(app: &Router, name: &str, email: &str) -> TestResponse {
    send(
        app,
        request(
            "POST",
            "/api/v1/auth/signup",
            Some(serde_json::json!({ "name": name, "email": email, "password": PASSWORD })),
            None,
            None,
        ),
    )
    .await
}

pub async fn login(app: &Router, email: &str, password: &str) -> TestResponse {
    send(
        app,
        request(
            "POST",
            "/api/v1/auth/login",
            Some(serde_json::json!({ "email": email, "password": password })),
            None,
            None,
        ),
    )
    .await
}

pub struct TestUser {
    pub id: i64,
    pub access_token: String,
    pub refresh_token: String,
}

/// Sign up and log in, returning the user's ID and both tokens.
pub async fn create_user(app: &Router, name: &str, email: &str) -> TestUser {
    let signed_up = signup(app, name, email).await;
    assert_eq!(signed_up.status, StatusCode::CREATED);
    let id = signed_up.json["data"]["id"].as_i64().unwrap();

    let logged_in = login(app, email, PASSWORD).await;
    assert_eq!(logged_in.status, StatusCode::OK);

    TestUser {
        id,
        access_token: logged_in.json["accessToken"].as_str().unwrap().to_string(),
        refresh_token: logged_in.refresh_token().unwrap(),
    }
}

pub async fn create_post(app: &Router, user: &TestUser, title: &str) -> i64 {
    let created = send(
        app,
        request(
            "POST",
            "/api/v1/posts",
            Some(serde_json::json!({ "title": title, "body": "Some body", "category": "TECH" })),
            Some(&user.access_token),
            None,
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    created.json["data"]["id"].as_i64().unwrap()
}

/// An access token signed with the right secret whose expiry has passed.
pub fn expired_access_token(user_id: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = AccessClaims {
        sub: user_id.to_string(),
        token_type: TokenType::Access,
        iat: now - 120,
        exp: now - 60,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(ACCESS_SECRET),
    )
    .unwrap()
}
