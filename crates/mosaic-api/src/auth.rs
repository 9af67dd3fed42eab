//! The authenticated-caller extractor.
//!
//! Authentication itself happens outside this crate: whatever sits in front of
//! the API router (the server's session gate, or a test) inserts a
//! [`CurrentUser`] into the request extensions. Handlers only read it back.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// Store id of the user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CurrentUser>()
      .copied()
      .ok_or(ApiError::Unauthorized)
  }
}
