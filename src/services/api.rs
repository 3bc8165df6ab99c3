// Thin client for the external REST API. Decodes envelopes, nothing else.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::models::content::{ApiEnvelope, ContentDetail, ContentKind, Syllabus};

/// The subscription-check collaborator.
pub trait SubscriptionCheck: Send + Sync {
    /// `Ok(active)` on 200, `Err` with the HTTP status otherwise.
    fn check_subscription(
        &self,
        token: &str,
        kind: ContentKind,
    ) -> impl Future<Output = Result<bool, ApiError>> + Send;
}

/// The content-detail collaborator.
pub trait ContentSource: Send + Sync {
    /// `Ok(None)` when the API answers with `status: false`.
    fn content_detail(
        &self,
        kind: ContentKind,
        slug: &str,
        category_id: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<Option<ContentDetail>, ApiError>> + Send;
}

#[derive(Deserialize)]
struct SubscriptionBody {
    #[serde(default)]
    status: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the external API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Client build error: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /syllabus`, `Ok(None)` when the API answers with `status: false`.
    pub async fn syllabi(&self) -> Result<Option<Vec<Syllabus>>, ApiError> {
        let url = format!("{}/syllabus", self.base_url);
        let envelope: ApiEnvelope<Vec<Syllabus>> = send_json(self.http.get(&url)).await?;
        Ok(envelope_data(envelope))
    }
}

impl ContentSource for ApiClient {
    /// `GET /{kind}-detail/{slug}?category={category_id}`
    async fn content_detail(
        &self,
        kind: ContentKind,
        slug: &str,
        category_id: &str,
        token: Option<&str>,
    ) -> Result<Option<ContentDetail>, ApiError> {
        let url = format!("{}/{}-detail/{}", self.base_url, kind.detail_prefix(), slug);
        tracing::debug!("📄 Fetching {} detail: {}", kind, slug);

        let mut request = self.http.get(&url).query(&[("category", category_id)]);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let envelope: ApiEnvelope<ContentDetail> = send_json(request).await?;
        Ok(envelope_data(envelope))
    }
}

impl SubscriptionCheck for ApiClient {
    async fn check_subscription(&self, token: &str, kind: ContentKind) -> Result<bool, ApiError> {
        let url = format!("{}/user-subscription", self.base_url);
        tracing::debug!("🔍 Checking {} subscription", kind.subscription_type());

        let request = self
            .http
            .get(&url)
            .query(&[("type", kind.subscription_type())])
            .bearer_auth(token);

        let body: SubscriptionBody = send_json(request).await?;
        Ok(body.status)
    }
}

/// Payload of a successful envelope; `status: false` means no data.
fn envelope_data<T>(envelope: ApiEnvelope<T>) -> Option<T> {
    envelope.data.filter(|_| envelope.status)
}

/// Sends `request`, mapping non-2xx answers to `ApiError::Status`.
async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(status_error(status, &bytes));
    }

    sonic_rs::from_slice(&bytes).map_err(|e| ApiError::Parse(e.to_string()))
}

fn status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let message = sonic_rs::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_body_error_field() {
        let err = status_error(StatusCode::FORBIDDEN, br#"{"error":"Plan too small"}"#);
        assert_eq!(
            err,
            ApiError::Status { status: 403, message: "Plan too small".into() }
        );
    }

    #[test]
    fn status_error_falls_back_to_reason_phrase() {
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(
            err,
            ApiError::Status { status: 500, message: "Internal Server Error".into() }
        );

        let err = status_error(StatusCode::UNAUTHORIZED, br#"{"error":""}"#);
        assert_eq!(err.detail(), "Unauthorized");
    }

    #[test]
    fn unsuccessful_envelope_has_no_data() {
        let envelope: ApiEnvelope<Vec<Syllabus>> =
            sonic_rs::from_str(r#"{"status":false,"data":null}"#).unwrap();
        assert_eq!(envelope_data(envelope), None);

        let envelope: ApiEnvelope<Vec<Syllabus>> =
            sonic_rs::from_str(r#"{"status":false,"data":[{"id":1,"name":"Physics"}]}"#).unwrap();
        assert_eq!(envelope_data(envelope), None);

        let envelope: ApiEnvelope<Vec<Syllabus>> =
            sonic_rs::from_str(r#"{"status":true,"data":[]}"#).unwrap();
        assert_eq!(envelope_data(envelope), Some(Vec::new()));
    }

    #[tokio::test]
    async fn syllabi_without_data_is_none() {
        use axum::{routing::get, Router};

        let app = Router::new().route(
            "/syllabus",
            get(|| async { r#"{"status":false,"data":null}"# }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = ApiClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        assert_eq!(client.syllabi().await.unwrap(), None);
    }

    #[test]
    fn base_url_is_normalised() {
        let client = ApiClient::new("http://localhost:9000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api");
    }
}
