use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    error::Result,
    handlers::response,
    middleware_layer::credentials::request_store,
    models::access::NavigationOutcome,
    models::content::{ContentKind, ContentRef},
    services::content as content_service,
    services::sessions::{ActiveSession, SessionView},
    state::AppState,
};

/// The response payload for an allowed content page.
#[derive(Serialize)]
pub struct ContentPageResponse {
    pub outcome: &'static str,
    pub to: String,
    pub content: Option<ContentRef>,
    /// Absent for untimed content.
    pub session: Option<SessionView>,
}

/// Opens a gated content page: access check, then the timed session.
#[axum::debug_handler]
pub async fn open_content(
    State(state): State<AppState>,
    cookies: Cookies,
    Path((kind, slug)): Path<(String, String)>,
) -> Result<Response> {
    let kind: ContentKind = kind.parse()?;
    tracing::info!("📖 Opening {} {}", kind, slug);

    let store = request_store(&state, cookies);
    let opened = content_service::open_page(
        state.api.as_ref(),
        &state.gate,
        &store,
        &state.paths,
        kind,
        &slug,
    )
    .await;

    let to = match opened.outcome {
        NavigationOutcome::Navigate { to } => to,
        other => return Ok(outcome_response(other)),
    };

    let mut session = None;
    if let Some((page, forced)) = opened.mounted {
        if page.session().is_some() {
            let owner = store.owner();
            let id = state
                .sessions
                .insert(ActiveSession::new(page, forced, owner))
                .await;
            session = state.sessions.view(id, owner).await;
            tracing::info!("✅ Timed session {} started for {}", id, slug);
        }
    }

    let body = ContentPageResponse {
        outcome: "navigate",
        to,
        content: opened.content,
        session,
    };

    Ok(response::json(StatusCode::OK, &body))
}

/// Renders a denial: a 303 to the destination with the toast message, or
/// the inline error for the page to show.
pub fn outcome_response(outcome: NavigationOutcome) -> Response {
    match &outcome {
        NavigationOutcome::Redirect { to, .. } => {
            let mut res = response::json(StatusCode::SEE_OTHER, &outcome);
            match HeaderValue::from_str(to) {
                Ok(location) => {
                    res.headers_mut().insert(header::LOCATION, location);
                }
                Err(e) => tracing::error!("❌ Invalid redirect target {}: {}", to, e),
            }
            res
        }
        _ => response::json(StatusCode::OK, &outcome),
    }
}
