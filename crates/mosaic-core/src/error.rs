//! Error types for `mosaic-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  /// A mandatory field was absent or blank.
  #[error("{field} is required")]
  Validation { field: &'static str },
}

impl Error {
  pub(crate) fn missing(field: &'static str) -> Self {
    Self::Validation { field }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
