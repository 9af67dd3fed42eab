//! [`SqliteStore`] — the SQLite implementation of [`MosaicStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use mosaic_core::{
  input::{MemoryPatch, NewComment, NewMemory, NewPerson},
  person::{Memory, Person},
  store::MosaicStore,
  user::{ExternalProfile, User},
};

use crate::{
  encode::{
    decode_person, encode_dt, encode_person, encode_uuid, json_in_call, RawUser,
  },
  schema::SCHEMA,
  Result,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Read one user row keyed on `column`, plus the ids of the people it owns.
fn read_user(
  conn:   &rusqlite::Connection,
  column: &'static str,
  key:    &str,
) -> rusqlite::Result<Option<RawUser>> {
  let sql = format!(
    "SELECT user_id, external_id, name, email, profile_picture, created_at
     FROM users WHERE {column} = ?1"
  );

  let Some(mut raw) = conn
    .query_row(&sql, rusqlite::params![key], |row| {
      Ok(RawUser {
        user_id:         row.get(0)?,
        external_id:     row.get(1)?,
        name:            row.get(2)?,
        email:           row.get(3)?,
        profile_picture: row.get(4)?,
        created_at:      row.get(5)?,
        people:          Vec::new(),
      })
    })
    .optional()?
  else {
    return Ok(None);
  };

  let mut stmt =
    conn.prepare("SELECT person_id FROM people WHERE user_id = ?1 ORDER BY seq")?;
  raw.people = stmt
    .query_map(rusqlite::params![raw.user_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  Ok(Some(raw))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Memory Mosaic store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection. Other clones of this store fail from
  /// then on.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Delete every user and every person. Returns `(users, people)` removed.
  pub async fn clear_all(&self) -> Result<(u64, u64)> {
    let counts = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let people = tx.execute("DELETE FROM people", [])?;
        let users = tx.execute("DELETE FROM users", [])?;
        tx.commit()?;
        Ok((users as u64, people as u64))
      })
      .await?;
    Ok(counts)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read-modify-write one person document inside a single transaction.
  ///
  /// `f` returns `None` to abandon the write (e.g. the memory it targets does
  /// not exist); nothing is persisted in that case.
  async fn modify_person<T, F>(
    &self,
    person_id: Uuid,
    user_id:   Uuid,
    f:         F,
  ) -> Result<Option<T>>
  where
    F: FnOnce(&mut Person) -> Option<T> + Send + 'static,
    T: Send + 'static,
  {
    let person_id_str = encode_uuid(person_id);
    let user_id_str   = encode_uuid(user_id);

    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raw: Option<String> = tx
          .query_row(
            "SELECT document FROM people WHERE person_id = ?1 AND user_id = ?2",
            rusqlite::params![person_id_str, user_id_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(raw) = raw else { return Ok(None) };

        let mut person = decode_person(&raw).map_err(json_in_call)?;
        let Some(out) = f(&mut person) else { return Ok(None) };

        let document = encode_person(&person).map_err(json_in_call)?;
        tx.execute(
          "UPDATE people SET document = ?1 WHERE person_id = ?2",
          rusqlite::params![document, person_id_str],
        )?;
        tx.commit()?;
        Ok(Some(out))
      })
      .await?;

    Ok(out)
  }
}

// ─── MosaicStore impl ────────────────────────────────────────────────────────

impl MosaicStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
    let key = external_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| Ok(read_user(conn, "external_id", &key)?))
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn create_or_get_user(&self, profile: ExternalProfile) -> Result<User> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());

    let (inserted, raw) = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO users
             (user_id, external_id, name, email, profile_picture, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (external_id) DO NOTHING",
          rusqlite::params![
            id_str,
            profile.external_id,
            profile.name,
            profile.email,
            profile.picture_url,
            at_str,
          ],
        )?;
        let raw = read_user(conn, "external_id", &profile.external_id)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        Ok((inserted > 0, raw))
      })
      .await?;

    let user = raw.into_user()?;
    if inserted {
      tracing::info!(user_id = %user.user_id, "registered new user");
    }
    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let key = encode_uuid(user_id);

    let raw = self
      .conn
      .call(move |conn| Ok(read_user(conn, "user_id", &key)?))
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── People ────────────────────────────────────────────────────────────────

  async fn list_people(&self, user_id: Uuid) -> Result<Vec<Person>> {
    let user_id_str = encode_uuid(user_id);

    let docs: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT document FROM people WHERE user_id = ?1 ORDER BY seq")?;
        let rows = stmt
          .query_map(rusqlite::params![user_id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      docs
        .iter()
        .map(|d| decode_person(d))
        .collect::<serde_json::Result<Vec<_>>>()?,
    )
  }

  async fn get_person(&self, person_id: Uuid, user_id: Uuid) -> Result<Option<Person>> {
    let person_id_str = encode_uuid(person_id);
    let user_id_str   = encode_uuid(user_id);

    let doc: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT document FROM people WHERE person_id = ?1 AND user_id = ?2",
            rusqlite::params![person_id_str, user_id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    Ok(doc.as_deref().map(decode_person).transpose()?)
  }

  async fn create_person(&self, user_id: Uuid, input: NewPerson) -> Result<Person> {
    let person = Person::create(user_id, input, Utc::now());

    let person_id_str = encode_uuid(person.person_id);
    let user_id_str   = encode_uuid(user_id);
    let document      = encode_person(&person)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO people (person_id, user_id, document) VALUES (?1, ?2, ?3)",
          rusqlite::params![person_id_str, user_id_str, document],
        )?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  async fn update_person_photo(
    &self,
    person_id: Uuid,
    user_id:   Uuid,
    photo_url: String,
  ) -> Result<Option<Person>> {
    self
      .modify_person(person_id, user_id, move |person| {
        person.set_profile_picture(photo_url);
        Some(person.clone())
      })
      .await
  }

  async fn delete_person(&self, person_id: Uuid, user_id: Uuid) -> Result<Option<Person>> {
    let person_id_str = encode_uuid(person_id);
    let user_id_str   = encode_uuid(user_id);

    let doc: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let doc: Option<String> = tx
          .query_row(
            "SELECT document FROM people WHERE person_id = ?1 AND user_id = ?2",
            rusqlite::params![person_id_str, user_id_str],
            |row| row.get(0),
          )
          .optional()?;
        if doc.is_some() {
          tx.execute(
            "DELETE FROM people WHERE person_id = ?1",
            rusqlite::params![person_id_str],
          )?;
          tx.commit()?;
        }
        Ok(doc)
      })
      .await?;

    Ok(doc.as_deref().map(decode_person).transpose()?)
  }

  async fn delete_all_people(&self, user_id: Uuid) -> Result<u64> {
    let user_id_str = encode_uuid(user_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM people WHERE user_id = ?1",
          rusqlite::params![user_id_str],
        )?)
      })
      .await?;

    Ok(deleted as u64)
  }

  // ── Memories & comments ───────────────────────────────────────────────────

  async fn add_memory(
    &self,
    person_id: Uuid,
    user_id:   Uuid,
    input:     NewMemory,
  ) -> Result<Option<Person>> {
    self
      .modify_person(person_id, user_id, move |person| {
        person.push_memory(input, Utc::now());
        Some(person.clone())
      })
      .await
  }

  async fn delete_memory(
    &self,
    person_id: Uuid,
    user_id:   Uuid,
    memory_id: Uuid,
  ) -> Result<Option<Person>> {
    self
      .modify_person(person_id, user_id, move |person| {
        person.remove_memory(memory_id)?;
        Some(person.clone())
      })
      .await
  }

  async fn update_memory(
    &self,
    person_id: Uuid,
    user_id:   Uuid,
    memory_id: Uuid,
    patch:     MemoryPatch,
  ) -> Result<Option<Person>> {
    self
      .modify_person(person_id, user_id, move |person| {
        person.apply_patch(memory_id, patch, Utc::now())?;
        Some(person.clone())
      })
      .await
  }

  async fn add_comment(
    &self,
    person_id: Uuid,
    user_id:   Uuid,
    memory_id: Uuid,
    input:     NewComment,
  ) -> Result<Option<Memory>> {
    self
      .modify_person(person_id, user_id, move |person| {
        person.push_comment(memory_id, input, Utc::now()).cloned()
      })
      .await
  }
}
