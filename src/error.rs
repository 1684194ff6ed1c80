use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::metrics;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("label \"{0}\" already in use")]
    DuplicateLabel(String),

    #[error("no such source(s): {0}")]
    UnknownSource(String),

    #[error("aggregate \"{label}\" cannot use aggregate \"{source_label}\" as its source")]
    InvalidSource { label: String, source_label: String },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SeriesError {
    /// Builds an `UnknownSource` error naming every missing label, sorted.
    pub(crate) fn unknown_sources<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        labels.sort();
        SeriesError::UnknownSource(labels.join(", "))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SeriesError::DuplicateLabel(_)
            | SeriesError::UnknownSource(_)
            | SeriesError::InvalidSource { .. }
            | SeriesError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            SeriesError::Config(_) | SeriesError::Storage(_) | SeriesError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<serde_json::Error> for SeriesError {
    fn from(err: serde_json::Error) -> Self {
        SeriesError::MalformedInput(format!("unable to parse request body as JSON: {}", err))
    }
}

impl IntoResponse for SeriesError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_client_error() {
            metrics::record_rejected_request();
            warn!("Rejecting request: {}", self);
        } else {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, SeriesError>;
