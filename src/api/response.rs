//! Success envelope shared by API endpoints.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::AuthGrant;

/// `{ success: true, message, data?, newAccessToken? }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T = ()> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(rename = "newAccessToken", skip_serializing_if = "Option::is_none")]
    new_access_token: Option<String>,
}

impl ApiResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            new_access_token: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn with_data<U: Serialize>(self, data: U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            message: self.message,
            data: Some(data),
            new_access_token: self.new_access_token,
        }
    }

    /// Carry over a token renewed by the auth gate, if any.
    pub fn renewed(mut self, grant: &AuthGrant) -> Self {
        self.new_access_token = grant.renewed_access_token.clone();
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
