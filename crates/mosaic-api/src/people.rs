//! Handlers for `/people` endpoints.
//!
//! | Method   | Path                  | Notes |
//! |----------|-----------------------|-------|
//! | `GET`    | `/people`             | Caller's people, insertion order |
//! | `POST`   | `/people`             | Fields `name`, optional file `photo` |
//! | `DELETE` | `/people`             | Deletes every person of the caller |
//! | `GET`    | `/people/:id`         | 404 if missing or not the caller's |
//! | `DELETE` | `/people/:id`         | Cascades to memories and comments |
//! | `PUT`    | `/people/:id/photo`   | File `photo` required |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mosaic_core::{input::NewPerson, person::Person, store::MosaicStore};
use serde_json::json;

use crate::{
  ApiState,
  auth::CurrentUser,
  error::ApiError,
  form::{PhotoForm, missing},
  parse_id,
  uploads::BlobStore,
};

fn person_not_found() -> ApiError { ApiError::NotFound("Person not found".into()) }

// ─── List / get ──────────────────────────────────────────────────────────────

/// `GET /people`
pub async fn list<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  let people = state
    .store
    .list_people(user_id)
    .await
    .map_err(ApiError::store("Error fetching people"))?;
  Ok(Json(people))
}

/// `GET /people/:id`
pub async fn get_one<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Person>, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  let person_id = parse_id(&id, person_not_found)?;
  let person = state
    .store
    .get_person(person_id, user_id)
    .await
    .map_err(ApiError::store("Error fetching person"))?
    .ok_or_else(person_not_found)?;
  Ok(Json(person))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /people`
pub async fn create<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  mut form: PhotoForm,
) -> Result<impl IntoResponse, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  // Validate before anything is written to the blob store.
  let input = NewPerson::new(form.text("name"), None)?;
  let photo_url = match form.photo.take() {
    Some(upload) => Some(state.store_photo(upload).await?),
    None => None,
  };

  let person = state
    .store
    .create_person(user_id, input.with_profile_picture(photo_url))
    .await
    .map_err(ApiError::store("Error creating person"))?;

  tracing::info!(%user_id, person_id = %person.person_id, "created person");
  Ok((StatusCode::CREATED, Json(person)))
}

// ─── Photo ───────────────────────────────────────────────────────────────────

/// `PUT /people/:id/photo`
pub async fn update_photo<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<String>,
  mut form: PhotoForm,
) -> Result<Json<Person>, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  let person_id = parse_id(&id, person_not_found)?;
  let upload = form.photo.take().ok_or_else(|| missing("photo"))?;

  // Skip the upload entirely when the person is not the caller's.
  state
    .store
    .get_person(person_id, user_id)
    .await
    .map_err(ApiError::store("Error updating photo"))?
    .ok_or_else(person_not_found)?;

  let photo_url = state.store_photo(upload).await?;
  let person = state
    .store
    .update_person_photo(person_id, user_id, photo_url)
    .await
    .map_err(ApiError::store("Error updating photo"))?
    .ok_or_else(person_not_found)?;
  Ok(Json(person))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /people/:id`
pub async fn delete_one<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  let person_id = parse_id(&id, person_not_found)?;
  let person = state
    .store
    .delete_person(person_id, user_id)
    .await
    .map_err(ApiError::store("Error deleting person"))?
    .ok_or_else(person_not_found)?;

  tracing::info!(%user_id, %person_id, "deleted person");
  Ok(Json(json!({
    "message":       "Person deleted successfully",
    "deletedPerson": person,
  })))
}

/// `DELETE /people`
pub async fn delete_all<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  let deleted = state
    .store
    .delete_all_people(user_id)
    .await
    .map_err(ApiError::store("Error deleting people"))?;

  tracing::info!(%user_id, deleted, "deleted all people");
  Ok(Json(json!({
    "message":      format!("{deleted} people deleted"),
    "deletedCount": deleted,
  })))
}
