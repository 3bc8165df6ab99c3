use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use http::{header, HeaderValue, Method};
use tower_cookies::CookieManagerLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    error::{AppError, Result},
    handlers, middleware_layer,
    state::AppState,
};

/// Builds the portal router.
///
/// Gated content sits behind the syllabus check and a per-IP rate limiter,
/// so the service must be served with `into_make_service_with_connect_info`.
pub fn router(state: AppState) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
            HeaderValue::from_static("http://localhost:5173"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let gate_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(1)
            .burst_size(30)
            .use_headers()
            .finish()
            .ok_or_else(|| AppError::Internal("Invalid rate limit configuration".to_string()))?,
    );

    let content_routes = Router::new()
        .route(
            "/api/content/{kind}/{slug}",
            get(handlers::content::open_content),
        )
        .layer(tower_governor::GovernorLayer::new(gate_governor_conf))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::credentials::require_syllabus,
        ))
        .with_state(state.clone());

    let session_routes = Router::new()
        .route(
            "/api/sessions/{session_id}",
            get(handlers::sessions::get_session).delete(handlers::sessions::end_session),
        )
        .with_state(state.clone());

    let dashboard_routes = Router::new()
        .route("/api/syllabus", get(handlers::syllabus::list_syllabi))
        .route(
            "/api/syllabus/select",
            post(handlers::syllabus::select_syllabus),
        )
        .route("/api/dashboard/sidebar", get(handlers::syllabus::sidebar))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::credentials::load_credentials,
        ))
        .with_state(state.clone());

    let auth_routes = Router::new()
        .route("/api/auth/token", post(handlers::auth::store_token))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .with_state(state);

    Ok(Router::new()
        .merge(content_routes)
        .merge(session_routes)
        .merge(dashboard_routes)
        .merge(auth_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(cors))
}
