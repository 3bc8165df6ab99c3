use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    handlers::response,
    middleware_layer::credentials::request_store,
    state::AppState,
};

/// Returns the countdown of a timed session.
///
/// Once expired, the view carries the forced-navigation target and the
/// session is destroyed. Only the token that opened the page can read it.
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(session_id): Path<Uuid>,
) -> Result<Response> {
    let owner = request_store(&state, cookies).owner();
    let view = state
        .sessions
        .view(session_id, owner)
        .await
        .ok_or(AppError::SessionNotFound)?;

    tracing::debug!("⏱️ Session {} at {}", session_id, view.display);
    Ok(response::json(StatusCode::OK, &view))
}

/// Unmounts a page: cancels its timer so no completion fires afterwards.
#[axum::debug_handler]
pub async fn end_session(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(session_id): Path<Uuid>,
) -> Result<Response> {
    let owner = request_store(&state, cookies).owner();
    if !state.sessions.remove(session_id, owner).await {
        return Err(AppError::SessionNotFound);
    }

    tracing::info!("🛑 Session ended by page: {}", session_id);
    Ok(StatusCode::NO_CONTENT.into_response())
}
