//! Authentication endpoints

use crate::gateway::ApiRequest;
use crate::session::User;
use serde::Deserialize;
use serde_json::json;

/// `POST /auth/signup`
pub fn signup(email: &str, password: &str, full_name: &str) -> ApiRequest {
    ApiRequest::post("/auth/signup")
        .body(json!({
            "email": email,
            "password": password,
            "full_name": full_name,
        }))
        .fallback("Signup failed")
}

/// `POST /auth/login`
pub fn login(email: &str, password: &str) -> ApiRequest {
    ApiRequest::post("/auth/login")
        .body(json!({ "email": email, "password": password }))
        .fallback("Login failed")
}

/// `GET /auth/me`, the identity check
pub fn me() -> ApiRequest {
    ApiRequest::get("/auth/me")
}

/// `POST /auth/logout`
pub fn logout() -> ApiRequest {
    ApiRequest::post("/auth/logout").fallback("Logout failed")
}

/// `DELETE /auth/me`
pub fn delete_account() -> ApiRequest {
    ApiRequest::delete("/auth/me").fallback("Delete failed")
}

/// `POST /auth/forgot-password`
pub fn forgot_password(email: &str) -> ApiRequest {
    ApiRequest::post("/auth/forgot-password")
        .body(json!({ "email": email }))
        .fallback("Failed to send reset link")
}

/// `POST /auth/reset-password`
pub fn reset_password(token: &str, new_password: &str) -> ApiRequest {
    ApiRequest::post("/auth/reset-password")
        .body(json!({ "token": token, "new_password": new_password }))
        .fallback("Failed to reset password")
}

/// Login and signup response
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Identity-check response
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityResponse {
    #[serde(default)]
    pub user: Option<User>,
}

/// Endpoints that only report a status message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}
