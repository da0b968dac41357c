use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tickethub_auth::AuthError;

/// Request-level failure taxonomy for the reporting endpoints. Every
/// variant renders as the uniform error envelope
/// `{ "error": <kind>, "message": <text> }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("Data store unavailable")]
    DataStoreUnavailable,
    #[error("Report aggregation failed: {0}")]
    Aggregation(#[from] sqlx::Error),
    #[error("{0}")]
    Generic(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "Unauthorized",
            ApiError::Forbidden => "Forbidden",
            ApiError::DataStoreUnavailable => "DataStoreUnavailable",
            ApiError::Aggregation(_) => "AggregationFailure",
            ApiError::Generic(_) => "GenericFailure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::DataStoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Aggregation(_) | ApiError::Generic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Strip internal detail from server-side failures. Auth and
    /// availability outcomes are part of the contract and pass through.
    pub fn redacted(self) -> Self {
        match self {
            ApiError::Aggregation(_) | ApiError::Generic(_) => {
                ApiError::Generic("Internal server error".to_string())
            }
            other => other,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => ApiError::Unauthorized,
            AuthError::Forbidden => ApiError::Forbidden,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(kind = self.kind(), "report request failed: {}", self);
        }
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
