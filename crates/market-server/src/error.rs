use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use market_ingest::IngestError;
use market_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Startup and configuration failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("blob store error: {0}")]
    Blob(#[from] market_blob::BlobError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Record left behind by a partially failed create, for a later repair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Request-level failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the server-wide body limit.
    #[error("request body too large: {0}")]
    BodyTooLarge(String),
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Ingest(IngestError::NotFound(what.into()))
    }

    pub fn invalid_form(reason: impl Into<String>) -> Self {
        Self::Ingest(IngestError::InvalidForm(reason.into()))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Ingest(e) => e.code(),
            Self::Store(StoreError::NotFound(_)) => "not_found",
            Self::Store(_) => "store_error",
            Self::BadRequest(_) => "bad_request",
            Self::BodyTooLarge(_) => "payload_too_large",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Ingest(e) => match e {
                IngestError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                IngestError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                IngestError::InvalidForm(_) => StatusCode::BAD_REQUEST,
                IngestError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        let id = match &self {
            Self::Ingest(e) => e.pending_item().map(ToString::to_string),
            _ => None,
        };
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            id,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
