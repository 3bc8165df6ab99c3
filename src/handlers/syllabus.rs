use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    error::{AppError, Result},
    handlers::response,
    middleware_layer::credentials::request_store,
    models::credential::{Credential, SyllabusSelection},
    services::credentials::CredentialStore,
    services::syllabus::{SidebarLink, SyllabusSelectionState},
    state::AppState,
    validation::syllabus::SelectSyllabusRequest,
};

/// The response payload after choosing a syllabus.
#[derive(Serialize)]
pub struct SelectSyllabusResponse {
    pub selection: SyllabusSelection,
    /// True when this request unlocked the syllabus-scoped sections.
    pub unlocked: bool,
    pub sidebar: Vec<SidebarLink>,
}

/// Lists the syllabi the user can choose from.
#[axum::debug_handler]
pub async fn list_syllabi(State(state): State<AppState>) -> Result<Response> {
    let syllabi = state
        .api
        .syllabi()
        .await?
        .ok_or_else(|| AppError::NotFound("No data found".to_string()))?;
    tracing::debug!("📚 {} syllabi listed", syllabi.len());
    Ok(response::json(StatusCode::OK, &syllabi))
}

/// Chooses a syllabus and persists it in the category cookies.
#[axum::debug_handler]
pub async fn select_syllabus(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SelectSyllabusRequest>,
) -> Result<Response> {
    let selection = payload.into_selection()?;

    let store = request_store(&state, cookies);
    let selection_state = SyllabusSelectionState::from_credential(&store.get());
    let unlocked = selection_state.select(
        &store,
        &selection.category_id,
        &selection.category_name,
    )?;

    let body = SelectSyllabusResponse {
        sidebar: selection_state.sidebar(),
        selection,
        unlocked,
    };

    Ok(response::json(StatusCode::OK, &body))
}

/// Dashboard sidebar for the current credential.
#[axum::debug_handler]
pub async fn sidebar(Extension(credential): Extension<Credential>) -> Result<Response> {
    let links = SyllabusSelectionState::from_credential(&credential).sidebar();
    Ok(response::json(StatusCode::OK, &links))
}
