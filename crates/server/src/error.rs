//! Response envelope and API errors.
//!
//! Every response body, success or failure, has the shape
//! `{success, timestamp, data | error}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hashchain_chain::ChainError;
use serde::Serialize;
use thiserror::Error;

/// Uniform JSON envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    /// RFC 3339 time the response was produced.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            timestamp: now(),
            data: Some(data),
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            timestamp: now(),
            data: None,
            error: Some(error.into()),
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("X-Session-ID header is required")]
    MissingSession,

    #[error("Block data must be a string")]
    InvalidBlockData,

    #[error("Block index and data are required")]
    InvalidUpdate,

    #[error("Block index is required")]
    MissingIndex,

    #[error("invalid block index {index} (chain length {len})")]
    InvalidIndex { index: i64, len: usize },

    #[error("chain task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidIndex { index, len } => Self::InvalidIndex {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(Envelope::failure(self.to_string()))).into_response()
    }
}
