//! The `MosaicStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `mosaic-store-sqlite`).
//! Higher layers (`mosaic-api`, `mosaic-server`) depend on this abstraction,
//! not on any concrete backend.
//!
//! Every person-scoped method takes the caller's `user_id` explicitly. A
//! person owned by someone else is reported exactly like a missing one
//! (`None`), so callers can never learn whether it exists.

use std::future::Future;

use uuid::Uuid;

use crate::{
  input::{MemoryPatch, NewComment, NewMemory, NewPerson},
  person::{Memory, Person},
  user::{ExternalProfile, User},
};

/// Abstraction over a Memory Mosaic store backend.
///
/// Each write touches exactly one person document and is atomic with respect
/// to that document. When the target is missing nothing is written.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait MosaicStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Look a user up by the provider's identity id.
  fn find_user_by_external_id<'a>(
    &'a self,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Return the user for `profile.external_id`, inserting it first if absent.
  /// An existing user is returned unchanged.
  fn create_or_get_user(
    &self,
    profile: ExternalProfile,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by store id. Returns `None` if not found.
  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── People ────────────────────────────────────────────────────────────

  /// All people owned by `user_id`, in insertion order.
  fn list_people(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    person_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Persist a new person owned by `user_id`.
  fn create_person(
    &self,
    user_id: Uuid,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  fn update_person_photo(
    &self,
    person_id: Uuid,
    user_id: Uuid,
    photo_url: String,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Delete a person with every memory and comment it contains. Returns the
  /// deleted document.
  fn delete_person(
    &self,
    person_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Delete every person owned by `user_id`; returns how many were removed.
  fn delete_all_people(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Memories & comments ───────────────────────────────────────────────

  /// Append a memory; returns the updated person.
  fn add_memory(
    &self,
    person_id: Uuid,
    user_id: Uuid,
    input: NewMemory,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Remove a memory and its comments; `None` if the person or the memory is
  /// missing.
  fn delete_memory(
    &self,
    person_id: Uuid,
    user_id: Uuid,
    memory_id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  fn update_memory(
    &self,
    person_id: Uuid,
    user_id: Uuid,
    memory_id: Uuid,
    patch: MemoryPatch,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Append a comment; returns the updated memory.
  fn add_comment(
    &self,
    person_id: Uuid,
    user_id: Uuid,
    memory_id: Uuid,
    input: NewComment,
  ) -> impl Future<Output = Result<Option<Memory>, Self::Error>> + Send + '_;
}
