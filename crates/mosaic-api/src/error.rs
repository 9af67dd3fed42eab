//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"message": "..."}`; server-side failures add an
//! `"error"` field carrying the underlying cause.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A body the extractor refused, answered with the extractor's own status
  /// (e.g. 413 for an oversized upload).
  #[error("rejected body ({status}): {message}")]
  Rejected { status: StatusCode, message: String },

  #[error("{context}: {source}")]
  Store {
    context: &'static str,
    #[source]
    source:  BoxError,
  },

  #[error("upload failed: {0}")]
  Upload(#[source] BoxError),
}

impl ApiError {
  /// Adapter for `map_err` on store calls, tagging the failure with what the
  /// handler was doing.
  pub fn store<E>(context: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| Self::Store { context, source: Box::new(e) }
  }
}

impl From<mosaic_core::Error> for ApiError {
  fn from(e: mosaic_core::Error) -> Self { Self::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, json!({ "message": "Unauthorized" }))
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "message": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "message": m })),
      ApiError::Rejected { status, message } => (status, json!({ "message": message })),
      ApiError::Store { context, source } => {
        tracing::error!(error = %source, "{context}");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "message": context, "error": source.to_string() }),
        )
      }
      ApiError::Upload(e) => {
        tracing::error!(error = %e, "failed to store upload");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "message": "Error storing photo", "error": e.to_string() }),
        )
      }
    };
    (status, Json(body)).into_response()
  }
}
