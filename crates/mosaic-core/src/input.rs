//! Validated inputs accepted by [`crate::store::MosaicStore`].
//!
//! Each constructor rejects absent or blank mandatory fields with
//! [`Error::Validation`], so a store never sees an invalid write.

use crate::{Error, Result};

fn required(field: &'static str, value: Option<String>) -> Result<String> {
  match value {
    Some(v) if !v.trim().is_empty() => Ok(v),
    _ => Err(Error::missing(field)),
  }
}

fn optional(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::MosaicStore::create_person`].
#[derive(Debug, Clone)]
pub struct NewPerson {
  pub(crate) name:            String,
  pub(crate) profile_picture: Option<String>,
}

impl NewPerson {
  pub fn new(name: Option<String>, profile_picture: Option<String>) -> Result<Self> {
    Ok(Self {
      name:            required("name", name)?,
      profile_picture: optional(profile_picture),
    })
  }

  /// Attach a picture URL once it is known, e.g. after an upload completes.
  pub fn with_profile_picture(mut self, url: Option<String>) -> Self {
    self.profile_picture = optional(url);
    self
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn profile_picture(&self) -> Option<&str> { self.profile_picture.as_deref() }
}

// ─── Memory ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::MosaicStore::add_memory`].
#[derive(Debug, Clone)]
pub struct NewMemory {
  pub(crate) title:   String,
  pub(crate) photo:   String,
  /// Optional first comment, attached at creation time.
  pub(crate) comment: Option<String>,
}

impl NewMemory {
  pub fn new(
    title: Option<String>,
    photo: Option<String>,
    comment: Option<String>,
  ) -> Result<Self> {
    Ok(Self {
      title:   required("title", title)?,
      photo:   required("photo", photo)?,
      comment: optional(comment),
    })
  }

  pub fn title(&self) -> &str { &self.title }

  pub fn photo(&self) -> &str { &self.photo }

  pub fn comment(&self) -> Option<&str> { self.comment.as_deref() }
}

/// Partial update accepted by [`crate::store::MosaicStore::update_memory`].
///
/// Absent fields are left untouched. A comment, when present, is appended to
/// the memory rather than replacing anything.
#[derive(Debug, Clone, Default)]
pub struct MemoryPatch {
  pub(crate) title:   Option<String>,
  pub(crate) photo:   Option<String>,
  pub(crate) comment: Option<String>,
}

impl MemoryPatch {
  pub fn new(
    title: Option<String>,
    photo: Option<String>,
    comment: Option<String>,
  ) -> Result<Self> {
    let title = match title {
      Some(t) => Some(required("title", Some(t))?),
      None => None,
    };
    Ok(Self { title, photo: optional(photo), comment: optional(comment) })
  }

  pub fn with_photo(mut self, url: Option<String>) -> Self {
    self.photo = optional(url);
    self
  }

  pub fn is_empty(&self) -> bool {
    self.title.is_none() && self.photo.is_none() && self.comment.is_none()
  }
}

// ─── Comment ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::MosaicStore::add_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub(crate) text: String,
}

impl NewComment {
  pub fn new(text: Option<String>) -> Result<Self> {
    Ok(Self { text: required("text", text)? })
  }

  pub fn text(&self) -> &str { &self.text }
}
