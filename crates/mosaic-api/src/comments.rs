//! Handler for `POST /people/:id/memories/:memory_id/comments`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mosaic_core::{input::NewComment, store::MosaicStore};

use crate::{
  ApiState,
  auth::CurrentUser,
  error::ApiError,
  form::PhotoForm,
  memories::{explain_missing, parse_ids},
  uploads::BlobStore,
};

/// Field `text`. Answers with the updated memory.
pub async fn create<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
  Path((id, memory_id)): Path<(String, String)>,
  mut form: PhotoForm,
) -> Result<impl IntoResponse, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  // A missing text is reported before anything about the path.
  let input = NewComment::new(form.text("text"))?;
  let (person_id, memory_id) = parse_ids(&id, &memory_id)?;

  match state
    .store
    .add_comment(person_id, user_id, memory_id, input)
    .await
    .map_err(ApiError::store("Error adding comment"))?
  {
    Some(memory) => Ok((StatusCode::CREATED, Json(memory))),
    None => Err(explain_missing(&state, person_id, user_id).await),
  }
}
