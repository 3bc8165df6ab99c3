use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// The bearer token is missing or was rejected upstream.
    #[error("User is not authenticated. Please log in.")]
    Unauthenticated,

    /// The user has no subscription for the requested content kind.
    #[error("Please buy a subscription to access this course.")]
    NoSubscription,

    /// The user is subscribed, but on a plan that does not include the content.
    #[error("Feature not available in your plan. Please upgrade your subscription.")]
    PlanInsufficient,

    /// The external API could not be reached or answered with garbage.
    #[error("An error occurred: {0}")]
    Transport(String),

    /// A precondition (such as a chosen syllabus) is missing.
    #[error("{0}")]
    MissingPrerequisite(String),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The API returned no data for the request.
    #[error("{0}")]
    NotFound(String),

    /// The timed session does not exist or was already destroyed.
    #[error("Session not found")]
    SessionNotFound,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failures reported by the external REST API collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A non-2xx answer. `message` is the body's `error` field when present.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// The HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable detail, without the status prefix.
    pub fn detail(&self) -> &str {
        match self {
            ApiError::Status { message, .. } => message,
            ApiError::Network(detail) | ApiError::Parse(detail) => detail,
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err.status() {
            Some(401) => AppError::Unauthenticated,
            Some(404) => AppError::NotFound(err.detail().to_string()),
            _ => AppError::Transport(err.detail().to_string()),
        }
    }
}

/// Illegal transitions of the session timer state machine.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer is already running")]
    AlreadyRunning,

    #[error("timer was cancelled")]
    Cancelled,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthenticated => {
                tracing::warn!("Unauthenticated request");
                StatusCode::UNAUTHORIZED
            }

            AppError::NoSubscription | AppError::PlanInsufficient => {
                tracing::warn!("Subscription denied: {}", self);
                StatusCode::FORBIDDEN
            }

            AppError::Transport(ref detail) => {
                tracing::error!("Upstream API error: {}", detail);
                StatusCode::BAD_GATEWAY
            }

            AppError::MissingPrerequisite(ref msg) => {
                tracing::debug!("Missing prerequisite: {}", msg);
                StatusCode::PRECONDITION_FAILED
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                StatusCode::BAD_REQUEST
            }

            AppError::NotFound(ref msg) => {
                tracing::debug!("No data: {}", msg);
                StatusCode::NOT_FOUND
            }

            AppError::SessionNotFound => {
                tracing::debug!("Session not found");
                StatusCode::NOT_FOUND
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        crate::handlers::response::json_error(status, &message)
    }
}
