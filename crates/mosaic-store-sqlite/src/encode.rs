//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Person documents are stored
//! as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use mosaic_core::{person::Person, user::User};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Person documents ─────────────────────────────────────────────────────────

pub fn encode_person(person: &Person) -> serde_json::Result<String> {
  serde_json::to_string(person)
}

pub fn decode_person(s: &str) -> serde_json::Result<Person> { serde_json::from_str(s) }

/// Adapt a JSON failure raised inside a `Connection::call` closure.
pub fn json_in_call(e: serde_json::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row plus the ids of the people
/// the user owns.
pub struct RawUser {
  pub user_id:         String,
  pub external_id:     String,
  pub name:            String,
  pub email:           String,
  pub profile_picture: Option<String>,
  pub created_at:      String,
  pub people:          Vec<String>,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:         decode_uuid(&self.user_id)?,
      external_id:     self.external_id,
      name:            self.name,
      email:           self.email,
      profile_picture: self.profile_picture,
      people:          self
        .people
        .iter()
        .map(|s| decode_uuid(s))
        .collect::<Result<_>>()?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
