use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Serializes `value` with sonic-rs into a JSON response.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match sonic_rs::to_string(value) {
        Ok(body) => with_json_content_type(status, body),
        Err(e) => {
            tracing::error!("Response serialization failed: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// `{"error": message}` with the given status.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    let body = sonic_rs::to_string(&sonic_rs::json!({
        "error": message
    }))
    .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

    with_json_content_type(status, body)
}

fn with_json_content_type(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}
