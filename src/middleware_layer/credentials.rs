use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    services::credentials::{CookieCredentialStore, CredentialStore},
    services::navigation::MSG_SELECT_SYLLABUS,
    state::AppState,
};

/// Builds the cookie-backed credential store for this request.
pub fn request_store(state: &AppState, cookies: Cookies) -> CookieCredentialStore {
    CookieCredentialStore::new(cookies, state.cookie_policy(), state.clear_ledger.clone())
}

/// Snapshots the credential at "mount" time and stores it in the request
/// extensions.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
pub async fn load_credentials(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let credential = request_store(&state, cookies).get();
    tracing::debug!("🔑 Credential loaded: {:?}", credential);

    request.extensions_mut().insert(credential);
    next.run(request).await
}

/// Rejects syllabus-scoped requests when no syllabus is chosen, before
/// anything talks to the API.
pub async fn require_syllabus(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request<Body>,
    next: Next,
) -> Response {
    let credential = request_store(&state, cookies).get();

    if credential.selection().is_none() {
        tracing::warn!("❌ No syllabus selected for {}", request.uri().path());
        return AppError::MissingPrerequisite(MSG_SELECT_SYLLABUS.to_string()).into_response();
    }

    next.run(request).await
}
