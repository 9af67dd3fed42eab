//! Error types for the sign-in routes and their `IntoResponse` mapping.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("oauth state mismatch")]
  StateMismatch,
  #[error("identity provider error: {0}")]
  Provider(String),
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("invalid configuration: {0}")]
  Config(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      Error::StateMismatch => {
        return (
          StatusCode::BAD_REQUEST,
          Json(json!({ "message": "Invalid OAuth state" })),
        )
          .into_response();
      }
      Error::Provider(_) | Error::Http(_) => {
        (StatusCode::BAD_GATEWAY, "Identity provider error")
      }
      Error::Config(_) | Error::Store(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
      }
    };
    tracing::error!(error = %self, "{message}");
    (status, Json(json!({ "message": message, "error": self.to_string() })))
      .into_response()
  }
}
