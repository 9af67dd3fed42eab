//! `GET /user-profile` — the signed-in user's own record.

use axum::{Json, extract::State};
use mosaic_core::{store::MosaicStore, user::User};

use crate::{ApiState, auth::CurrentUser, error::ApiError, uploads::BlobStore};

pub async fn profile<S, B>(
  State(state): State<ApiState<S, B>>,
  CurrentUser(user_id): CurrentUser,
) -> Result<Json<User>, ApiError>
where
  S: MosaicStore,
  B: BlobStore,
{
  // A session whose user has since been removed is no session at all.
  let user = state
    .store
    .get_user(user_id)
    .await
    .map_err(ApiError::store("Error fetching user profile"))?
    .ok_or(ApiError::Unauthorized)?;
  Ok(Json(user))
}
