//! Request bodies for the write endpoints.
//!
//! The frontend posts `multipart/form-data` whenever a photo is involved and
//! may send plain JSON or urlencoded forms otherwise. [`PhotoForm`] accepts
//! all three and exposes the text fields plus at most one photo file.

use std::collections::HashMap;

use axum::{
  Form, Json,
  extract::{FromRequest, Multipart, Request, multipart::MultipartError},
  http::header::CONTENT_TYPE,
};
use serde_json::{Map, Value};

use crate::{error::ApiError, uploads::Upload};

/// Name of the multipart part carrying the photo file.
pub const PHOTO_FIELD: &str = "photo";

/// Text fields and an optional photo from a write request.
#[derive(Debug, Default)]
pub struct PhotoForm {
  fields:    HashMap<String, String>,
  pub photo: Option<Upload>,
}

impl PhotoForm {
  /// Take a text field out of the form.
  pub fn text(&mut self, name: &str) -> Option<String> { self.fields.remove(name) }

  /// Take a text field that must be present and non-blank.
  pub fn required(&mut self, name: &'static str) -> Result<String, ApiError> {
    self
      .text(name)
      .filter(|v| !v.trim().is_empty())
      .ok_or_else(|| missing(name))
  }
}

/// The 400 a handler returns for an absent mandatory field.
pub fn missing(field: &'static str) -> ApiError {
  mosaic_core::Error::Validation { field }.into()
}

fn bad_multipart(e: MultipartError) -> ApiError {
  ApiError::Rejected { status: e.status(), message: e.body_text() }
}

impl<S> FromRequest<S> for PhotoForm
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let content_type = req
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default()
      .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
      let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| ApiError::Rejected { status: e.status(), message: e.body_text() })?;
      return read_multipart(&mut multipart).await;
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
      let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
        .await
        .map_err(|e| ApiError::Rejected { status: e.status(), message: e.body_text() })?;
      return Ok(Self { fields, photo: None });
    }

    if content_type.starts_with("application/json") {
      let Json(body) = Json::<Map<String, Value>>::from_request(req, state)
        .await
        .map_err(|e| ApiError::Rejected { status: e.status(), message: e.body_text() })?;
      let fields = body
        .into_iter()
        .filter_map(|(k, v)| match v {
          Value::Null => None,
          Value::String(s) => Some((k, s)),
          other => Some((k, other.to_string())),
        })
        .collect();
      return Ok(Self { fields, photo: None });
    }

    // No body, or a type we do not read: treat as an empty form so the
    // handler reports the missing field.
    Ok(Self::default())
  }
}

async fn read_multipart(multipart: &mut Multipart) -> Result<PhotoForm, ApiError> {
  let mut form = PhotoForm::default();

  while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
    let name = field.name().unwrap_or_default().to_owned();

    if name == PHOTO_FIELD {
      let file_name = field.file_name().map(str::to_owned);
      let content_type = field.content_type().map(str::to_owned);
      let bytes = field.bytes().await.map_err(bad_multipart)?;
      // Browsers send an empty part when the file input was left blank.
      if !bytes.is_empty() {
        form.photo = Some(Upload { file_name, content_type, bytes });
      }
    } else {
      let value = field.text().await.map_err(bad_multipart)?;
      form.fields.insert(name, value);
    }
  }

  Ok(form)
}
