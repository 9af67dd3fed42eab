//! JSON REST API for Memory Mosaic.
//!
//! Exposes an axum [`Router`] backed by any [`mosaic_core::store::MosaicStore`]
//! and any [`uploads::BlobStore`]. Sessions, TLS, and static file serving are
//! the caller's responsibility: the router expects a [`CurrentUser`] in the
//! request extensions and answers 401 without one.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", mosaic_api::api_router(store.clone(), blobs.clone()).layer(gate))
//! ```

pub mod auth;
pub mod comments;
pub mod error;
pub mod form;
pub mod memories;
pub mod people;
pub mod uploads;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use mosaic_core::store::MosaicStore;
use uuid::Uuid;

pub use auth::CurrentUser;
pub use error::ApiError;
use uploads::{BlobStore, Upload};

/// Largest request body accepted, photo included.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared handler state.
pub struct ApiState<S, B> {
  pub store: Arc<S>,
  pub blobs: Arc<B>,
}

// Derived `Clone` would demand `S: Clone` and `B: Clone`.
impl<S, B> Clone for ApiState<S, B> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), blobs: Arc::clone(&self.blobs) }
  }
}

impl<S, B: BlobStore> ApiState<S, B> {
  pub(crate) async fn store_photo(&self, upload: Upload) -> Result<String, ApiError> {
    self
      .blobs
      .store(upload)
      .await
      .map_err(|e| ApiError::Upload(Box::new(e)))
  }
}

/// Parse a path id. Anything that is not a UUID cannot name a record, so it
/// gets the same answer as a missing one.
pub(crate) fn parse_id(raw: &str, not_found: fn() -> ApiError) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| not_found())
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, B>(store: Arc<S>, blobs: Arc<B>) -> Router<()>
where
  S: MosaicStore + 'static,
  B: BlobStore + 'static,
{
  Router::new()
    // People
    .route(
      "/people",
      get(people::list::<S, B>)
        .post(people::create::<S, B>)
        .delete(people::delete_all::<S, B>),
    )
    .route(
      "/people/{id}",
      get(people::get_one::<S, B>).delete(people::delete_one::<S, B>),
    )
    .route("/people/{id}/photo", put(people::update_photo::<S, B>))
    // Memories
    .route("/people/{id}/memories", post(memories::create::<S, B>))
    .route(
      "/people/{id}/memories/{memory_id}",
      put(memories::update::<S, B>).delete(memories::delete_one::<S, B>),
    )
    .route(
      "/people/{id}/memories/{memory_id}/comments",
      post(comments::create::<S, B>),
    )
    // Profile
    .route("/user-profile", get(users::profile::<S, B>))
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .with_state(ApiState { store, blobs })
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
    response::Response,
  };
  use mosaic_core::user::ExternalProfile;
  use mosaic_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  const BOUNDARY: &str = "mosaic-test-boundary";

  #[derive(Default)]
  struct MemoryBlobs {
    names: Mutex<Vec<Option<String>>>,
  }

  impl BlobStore for MemoryBlobs {
    type Error = std::io::Error;

    async fn store(&self, upload: Upload) -> std::io::Result<String> {
      let n = {
        let mut names = self.names.lock().unwrap();
        names.push(upload.file_name);
        names.len()
      };
      Ok(format!("/uploads/{n}.jpg"))
    }
  }

  struct Harness {
    app:   Router,
    store: Arc<SqliteStore>,
    blobs: Arc<MemoryBlobs>,
    user:  Uuid,
  }

  async fn harness() -> Harness {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let blobs = Arc::new(MemoryBlobs::default());
    let user = store
      .create_or_get_user(ExternalProfile {
        external_id: "google-1".into(),
        name:        "Ann".into(),
        email:       "ann@example.com".into(),
        picture_url: None,
      })
      .await
      .unwrap()
      .user_id;
    let app = api_router(store.clone(), blobs.clone());
    Harness { app, store, blobs, user }
  }

  fn json_req(method: &str, uri: &str, user: Uuid, body: Value) -> Request<Body> {
    Request::builder()
      .method(method)
      .uri(uri)
      .header(CONTENT_TYPE, "application/json")
      .extension(CurrentUser(user))
      .body(Body::from(body.to_string()))
      .unwrap()
  }

  fn empty_req(method: &str, uri: &str, user: Uuid) -> Request<Body> {
    Request::builder()
      .method(method)
      .uri(uri)
      .extension(CurrentUser(user))
      .body(Body::empty())
      .unwrap()
  }

  fn multipart_req(
    method: &str,
    uri: &str,
    user: Uuid,
    fields: &[(&str, &str)],
    photo: Option<(&str, &[u8])>,
  ) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
      body.extend_from_slice(
        format!(
          "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .as_bytes(),
      );
    }
    if let Some((file_name, bytes)) = photo {
      body.extend_from_slice(
        format!(
          "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; \
           filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
      );
      body.extend_from_slice(bytes);
      body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
      .method(method)
      .uri(uri)
      .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
      .extension(CurrentUser(user))
      .body(Body::from(body))
      .unwrap()
  }

  async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
  }

  async fn body_json(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn create_person(h: &Harness, name: &str) -> Value {
    let resp = send(&h.app, json_req("POST", "/people", h.user, json!({ "name": name }))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
  }

  async fn add_memory(h: &Harness, person_id: &str, title: &str) -> Value {
    let resp = send(
      &h.app,
      multipart_req(
        "POST",
        &format!("/people/{person_id}/memories"),
        h.user,
        &[("title", title), ("comment", "first")],
        Some(("beach.jpg", b"jpeg")),
      ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
  }

  // ─── Auth ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_current_user_is_unauthorized() {
    let h = harness().await;
    let req = Request::builder().uri("/people").body(Body::empty()).unwrap();
    let resp = send(&h.app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({ "message": "Unauthorized" }));
  }

  #[tokio::test]
  async fn user_profile_lists_owned_people() {
    let h = harness().await;
    let person = create_person(&h, "Bob").await;

    let resp = send(&h.app, empty_req("GET", "/user-profile", h.user)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let profile = body_json(resp).await;
    assert_eq!(profile["email"], "ann@example.com");
    assert_eq!(profile["people"], json!([person["_id"]]));
  }

  #[tokio::test]
  async fn user_profile_of_vanished_user_is_unauthorized() {
    let h = harness().await;
    let resp = send(&h.app, empty_req("GET", "/user-profile", Uuid::new_v4())).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ─── People ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn created_person_is_listed_exactly_once() {
    let h = harness().await;
    let person = create_person(&h, "Bob").await;
    assert_eq!(person["name"], "Bob");
    assert_eq!(person["user"], h.user.to_string());
    assert_eq!(person["memories"], json!([]));

    let resp = send(&h.app, empty_req("GET", "/people", h.user)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let people = body_json(resp).await;
    assert_eq!(people.as_array().unwrap().len(), 1);
    assert_eq!(people[0]["_id"], person["_id"]);
  }

  #[tokio::test]
  async fn create_person_without_name_is_rejected() {
    let h = harness().await;
    let resp = send(&h.app, json_req("POST", "/people", h.user, json!({ "name": "  " }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "name is required");
    assert!(h.store.list_people(h.user).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn create_person_with_photo_stores_upload() {
    let h = harness().await;
    let resp = send(
      &h.app,
      multipart_req("POST", "/people", h.user, &[("name", "Cleo")], Some(("cleo.jpg", b"img"))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let person = body_json(resp).await;
    assert_eq!(person["profilePicture"], "/uploads/1.jpg");
    assert_eq!(*h.blobs.names.lock().unwrap(), vec![Some("cleo.jpg".to_owned())]);
  }

  #[tokio::test]
  async fn urlencoded_bodies_are_accepted() {
    let h = harness().await;
    let req = Request::builder()
      .method("POST")
      .uri("/people")
      .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
      .extension(CurrentUser(h.user))
      .body(Body::from("name=Dora"))
      .unwrap();
    let resp = send(&h.app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["name"], "Dora");
  }

  #[tokio::test]
  async fn malformed_and_foreign_ids_are_not_found() {
    let h = harness().await;
    let person = create_person(&h, "Bob").await;
    let id = person["_id"].as_str().unwrap();

    let resp = send(&h.app, empty_req("GET", "/people/not-an-id", h.user)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let stranger = Uuid::new_v4();
    let resp = send(&h.app, empty_req("GET", &format!("/people/{id}"), stranger)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "Person not found");

    let resp = send(&h.app, empty_req("DELETE", &format!("/people/{id}"), stranger)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(h.store.get_person(id.parse().unwrap(), h.user).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn update_photo_requires_a_file() {
    let h = harness().await;
    let person = create_person(&h, "Bob").await;
    let uri = format!("/people/{}/photo", person["_id"].as_str().unwrap());

    let resp = send(&h.app, multipart_req("PUT", &uri, h.user, &[], None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "photo is required");

    let resp =
      send(&h.app, multipart_req("PUT", &uri, h.user, &[], Some(("new.jpg", b"x")))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["profilePicture"], "/uploads/1.jpg");
  }

  #[tokio::test]
  async fn delete_person_returns_the_document() {
    let h = harness().await;
    let person = create_person(&h, "Bob").await;
    let id = person["_id"].as_str().unwrap();
    add_memory(&h, id, "Beach").await;

    let resp = send(&h.app, empty_req("DELETE", &format!("/people/{id}"), h.user)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["message"], "Person deleted successfully");
    assert_eq!(body["deletedPerson"]["memories"][0]["title"], "Beach");

    let resp = send(&h.app, empty_req("GET", &format!("/people/{id}"), h.user)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn delete_all_reports_count() {
    let h = harness().await;
    create_person(&h, "Bob").await;
    create_person(&h, "Cleo").await;

    let resp = send(&h.app, empty_req("DELETE", "/people", h.user)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["deletedCount"], 2);
    assert_eq!(body["message"], "2 people deleted");
  }

  // ─── Memories & comments ───────────────────────────────────────────────────

  #[tokio::test]
  async fn memory_lifecycle() {
    let h = harness().await;
    let person = create_person(&h, "Bob").await;
    let id = person["_id"].as_str().unwrap();

    let person = add_memory(&h, id, "Beach").await;
    let memory = &person["memories"][0];
    assert_eq!(memory["photo"], "/uploads/1.jpg");
    assert_eq!(memory["comments"][0]["text"], "first");
    let memory_id = memory["_id"].as_str().unwrap().to_owned();
    let memory_uri = format!("/people/{id}/memories/{memory_id}");

    // Comment
    let resp = send(
      &h.app,
      json_req("POST", &format!("{memory_uri}/comments"), h.user, json!({ "text": "lovely" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let memory = body_json(resp).await;
    assert_eq!(memory["comments"].as_array().unwrap().len(), 2);
    assert_eq!(memory["comments"][1]["text"], "lovely");

    // Partial update
    let resp = send(
      &h.app,
      json_req("PUT", &memory_uri, h.user, json!({ "title": "Sunny beach" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let person = body_json(resp).await;
    assert_eq!(person["memories"][0]["title"], "Sunny beach");
    assert_eq!(person["memories"][0]["photo"], "/uploads/1.jpg");
    assert_eq!(person["memories"][0]["comments"].as_array().unwrap().len(), 2);

    // Delete, then delete again
    let resp = send(&h.app, empty_req("DELETE", &memory_uri, h.user)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["memories"], json!([]));

    let resp = send(&h.app, empty_req("DELETE", &memory_uri, h.user)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "Memory not found");
  }

  #[tokio::test]
  async fn memory_requires_title_and_photo() {
    let h = harness().await;
    let person = create_person(&h, "Bob").await;
    let uri = format!("/people/{}/memories", person["_id"].as_str().unwrap());

    let resp = send(
      &h.app,
      multipart_req("POST", &uri, h.user, &[], Some(("a.jpg", b"a"))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "title is required");

    let resp = send(&h.app, multipart_req("POST", &uri, h.user, &[("title", "Beach")], None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "photo is required");

    // Nothing was uploaded for either rejected request.
    assert!(h.blobs.names.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn blank_title_update_is_rejected() {
    let h = harness().await;
    let person = create_person(&h, "Bob").await;
    let id = person["_id"].as_str().unwrap();
    let person = add_memory(&h, id, "Beach").await;
    let memory_id = person["memories"][0]["_id"].as_str().unwrap();

    let resp = send(
      &h.app,
      json_req("PUT", &format!("/people/{id}/memories/{memory_id}"), h.user, json!({ "title": "" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn comment_text_is_checked_before_ids() {
    let h = harness().await;
    let uri = "/people/not-an-id/memories/also-not/comments";

    let resp = send(&h.app, json_req("POST", uri, h.user, json!({}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "text is required");

    let resp = send(&h.app, json_req("POST", uri, h.user, json!({ "text": "hi" }))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn oversized_photo_is_payload_too_large() {
    let h = harness().await;
    let big = vec![0u8; MAX_UPLOAD_BYTES + 10];
    let resp = send(
      &h.app,
      multipart_req("POST", "/people", h.user, &[("name", "Bob")], Some(("big.jpg", &big))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.store.list_people(h.user).await.unwrap().is_empty());
    assert!(h.blobs.names.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn malformed_json_keeps_extractor_status() {
    let h = harness().await;
    let req = Request::builder()
      .method("POST")
      .uri("/people")
      .header(CONTENT_TYPE, "application/json")
      .extension(CurrentUser(h.user))
      .body(Body::from("{not json"))
      .unwrap();
    let resp = send(&h.app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn comment_on_missing_memory_is_not_found() {
    let h = harness().await;
    let person = create_person(&h, "Bob").await;
    let id = person["_id"].as_str().unwrap();
    let uri = format!("/people/{id}/memories/{}/comments", Uuid::new_v4());

    let resp = send(&h.app, json_req("POST", &uri, h.user, json!({ "text": "hi" }))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "Memory not found");

    let uri = format!("/people/{}/memories/{}/comments", Uuid::new_v4(), Uuid::new_v4());
    let resp = send(&h.app, json_req("POST", &uri, h.user, json!({ "text": "hi" }))).await;
    assert_eq!(body_json(resp).await["message"], "Person not found");
  }
}
