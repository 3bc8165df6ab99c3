use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    handlers::response,
    middleware_layer::credentials::request_store,
    services::credentials::CredentialStore,
    state::AppState,
};

/// The request payload carrying a token issued by the auth flow.
#[derive(Deserialize)]
pub struct StoreTokenRequest {
    pub token: String,
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// Stores the bearer token after the user signed in.
#[axum::debug_handler]
pub async fn store_token(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<StoreTokenRequest>,
) -> Result<Response> {
    let token = payload.token.trim();
    if token.is_empty() {
        return Err(AppError::Validation("Token cannot be empty".to_string()));
    }

    request_store(&state, cookies).set_token(token);
    tracing::info!("✅ Bearer token stored");

    let body = AuthResponse {
        success: true,
        message: "Signed in".to_string(),
    };
    Ok(response::json(StatusCode::OK, &body))
}

/// Handles user logout: token and syllabus go together.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    request_store(&state, cookies).clear();
    tracing::info!("👋 User logged out");

    let body = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
    };
    Ok(response::json(StatusCode::OK, &body))
}
