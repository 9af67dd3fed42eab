//! Handlers for `/people/:id/memories` endpoints.
//!
//! Every handler answers with the whole updated [`Person`], which is what the
//! frontend re-renders from.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mosaic_core::{
  input::{MemoryPatch, NewMemory},
  person::Person,
  store::MosaicStore,
};
use uuid::Uuid;

use crate::{
  ApiState,
  auth::CurrentUser,
  error::ApiError,
  form::{PhotoForm, missing},
  parse_id,
  uploads::BlobStore,
};

fn person_not_found() -> ApiError { ApiError::NotFound("Person not found".into()) }

fn memory_not_found() -> ApiError { ApiError::NotFound("Memory not found".into()) }

/// Tell apart a missing person from a missing memory after a store call came
/// back empty.
pub(crate) async fn explain_missing<S, B>(
  state: &ApiState<S, B>,
  person_id: Uuid,
  user_id: Uuid,
) -> ApiError
where
  S: MosaicStore,
  B: BlobStore,
{
  match state.store.get_person(person_id, user_id).await {
    Ok(Some(_)) => memory_not_found(),
    Ok(None) => person_not_found(),
    Err(e) => ApiError::store("Error fetching person")(e),
  }
}

/// Parse the `(person, memory)` id pair from the path.
pub(crate) fn parse_ids(person: &str, memory: &str) -> Result<(Uuid, Uuid), ApiError> {
  Ok((parse_id(person, person_not_found)?, parse_id(memory, memory_not_found)?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /people/:id/memories` — fields `title`, optional `comment`, file
/// `photo`.
pub async fn create<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<String>,
  mut form: PhotoForm,
) -> Result<impl IntoResponse, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  let person_id = parse_id(&id, person_not_found)?;
  let title = form.required("title")?;
  let comment = form.text("comment");
  let upload = form.photo.take().ok_or_else(|| missing("photo"))?;

  state
    .store
    .get_person(person_id, user_id)
    .await
    .map_err(ApiError::store("Error adding memory"))?
    .ok_or_else(person_not_found)?;

  let photo_url = state.store_photo(upload).await?;
  let input = NewMemory::new(Some(title), Some(photo_url), comment)?;

  let person = state
    .store
    .add_memory(person_id, user_id, input)
    .await
    .map_err(ApiError::store("Error adding memory"))?
    .ok_or_else(person_not_found)?;

  tracing::info!(%user_id, %person_id, "added memory");
  Ok((StatusCode::CREATED, Json(person)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /people/:id/memories/:memory_id` — any of `title`, `comment`, file
/// `photo`. A comment is appended, never replaced.
pub async fn update<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  Path((id, memory_id)): Path<(String, String)>,
  mut form: PhotoForm,
) -> Result<Json<Person>, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  let (person_id, memory_id) = parse_ids(&id, &memory_id)?;
  let patch = MemoryPatch::new(form.text("title"), None, form.text("comment"))?;

  let patch = match form.photo.take() {
    Some(upload) => {
      let owned = state
        .store
        .get_person(person_id, user_id)
        .await
        .map_err(ApiError::store("Error updating memory"))?
        .ok_or_else(person_not_found)?;
      if owned.memory(memory_id).is_none() {
        return Err(memory_not_found());
      }
      patch.with_photo(Some(state.store_photo(upload).await?))
    }
    None => patch,
  };

  match state
    .store
    .update_memory(person_id, user_id, memory_id, patch)
    .await
    .map_err(ApiError::store("Error updating memory"))?
  {
    Some(person) => Ok(Json(person)),
    None => Err(explain_missing(&state, person_id, user_id).await),
  }
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /people/:id/memories/:memory_id`
pub async fn delete_one<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  Path((id, memory_id)): Path<(String, String)>,
) -> Result<Json<Person>, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  let (person_id, memory_id) = parse_ids(&id, &memory_id)?;

  match state
    .store
    .delete_memory(person_id, user_id, memory_id)
    .await
    .map_err(ApiError::store("Error deleting memory"))?
  {
    Some(person) => {
      tracing::info!(%user_id, %person_id, %memory_id, "deleted memory");
      Ok(Json(person))
    }
    None => Err(explain_missing(&state, person_id, user_id).await),
  }
}
