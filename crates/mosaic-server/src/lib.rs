//! HTTP server for Memory Mosaic.
//!
//! Wires Google sign-in, cookie sessions, and static upload serving around
//! the JSON API from `mosaic-api`. Every `/api` request passes through the
//! session gate, which turns the session cookie into a
//! [`mosaic_api::CurrentUser`].

pub mod error;
pub mod oauth;
pub mod session;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::{Query, Request, State},
  http::{HeaderMap, HeaderValue, Method, header},
  middleware::{self, Next},
  response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
  routing::get,
};
use mosaic_api::{ApiError, CurrentUser, uploads::DiskBlobStore};
use mosaic_core::store::MosaicStore;
use serde::Deserialize;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  services::ServeDir,
  trace::TraceLayer,
};
use uuid::Uuid;

use oauth::IdentityProvider;
use session::{
  SESSION_COOKIE, STATE_COOKIE, STATE_COOKIE_MAX_AGE, SessionStore, clear_cookie,
  random_token, read_cookie, set_cookie,
};

/// URL prefix uploaded files are served under.
pub const UPLOADS_PATH: &str = "/uploads";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MOSAIC_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  /// Absolute URL this server is reached at; the OAuth callback hangs off it.
  #[serde(default = "default_public_url")]
  pub public_url:           String,
  /// Where the browser lands after signing in.
  #[serde(default = "default_frontend_url")]
  pub frontend_url:         String,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  #[serde(default = "default_upload_dir")]
  pub upload_dir:           PathBuf,
  #[serde(default)]
  pub google_client_id:     String,
  #[serde(default)]
  pub google_client_secret: String,
  #[serde(default)]
  pub session_secret:       String,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours:    i64,
  #[serde(default = "default_allowed_origins")]
  pub allowed_origins:      Vec<String>,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 3000 }
fn default_public_url() -> String { "http://localhost:3000".into() }
fn default_frontend_url() -> String { "http://localhost:3001".into() }
fn default_store_path() -> PathBuf { PathBuf::from("mosaic.db") }
fn default_upload_dir() -> PathBuf { PathBuf::from("uploads") }
fn default_session_ttl_hours() -> i64 { 168 }
fn default_allowed_origins() -> Vec<String> {
  vec!["http://localhost:3000".into(), "http://localhost:3001".into()]
}

impl ServerConfig {
  /// Absolute URL of the OAuth callback route.
  pub fn callback_url(&self) -> String {
    format!("{}/auth/google/callback", self.public_url.trim_end_matches('/'))
  }

  /// Absolute URL prefix stored photos are addressed by. The frontend is
  /// served from another origin, so stored URLs must name this server.
  pub fn uploads_url(&self) -> String {
    format!("{}{UPLOADS_PATH}", self.public_url.trim_end_matches('/'))
  }

  /// Whether cookies should carry the `Secure` attribute.
  pub fn secure_cookies(&self) -> bool { self.public_url.starts_with("https://") }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the sign-in handlers and the session gate.
pub struct AppState<S, I> {
  pub store:    Arc<S>,
  pub blobs:    Arc<DiskBlobStore>,
  pub identity: Arc<I>,
  pub sessions: Arc<SessionStore>,
  pub config:   Arc<ServerConfig>,
}

impl<S, I> Clone for AppState<S, I> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      blobs:    Arc::clone(&self.blobs),
      identity: Arc::clone(&self.identity),
      sessions: Arc::clone(&self.sessions),
      config:   Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application [`Router`].
pub fn router<S, I>(state: AppState<S, I>) -> Router
where
  S: MosaicStore + 'static,
  I: IdentityProvider + 'static,
{
  let api = mosaic_api::api_router(state.store.clone(), state.blobs.clone())
    .layer(middleware::from_fn_with_state(state.clone(), session_gate::<S, I>));
  let uploads = ServeDir::new(state.blobs.dir());
  let cors = cors_layer(&state.config.allowed_origins);

  Router::new()
    .route("/", get(index::<S, I>))
    .route("/login", get(index::<S, I>))
    .route("/auth/google", get(login::<S, I>))
    .route("/auth/google/callback", get(callback::<S, I>))
    .route("/dashboard", get(dashboard::<S, I>))
    .route("/logout", get(logout::<S, I>))
    .with_state(state)
    .nest("/api", api)
    .nest_service(UPLOADS_PATH, uploads)
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}

/// Origins usable in a credentialed CORS allow-list. A wildcard cannot be
/// combined with credentials, so it is dropped like any unparsable entry.
fn cors_origins(origins: &[String]) -> Vec<HeaderValue> {
  origins
    .iter()
    .filter_map(|o| {
      if o.trim() == "*" {
        tracing::warn!("ignoring wildcard CORS origin; list origins explicitly");
        return None;
      }
      match HeaderValue::from_str(o) {
        Ok(v) => Some(v),
        Err(_) => {
          tracing::warn!(origin = %o, "ignoring invalid CORS origin");
          None
        }
      }
    })
    .collect()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  CorsLayer::new()
    .allow_origin(AllowOrigin::list(cors_origins(origins)))
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
    .allow_headers([header::CONTENT_TYPE])
    .allow_credentials(true)
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// The signed-in user behind the request's session cookie. A session whose
/// user no longer exists counts as signed out.
async fn signed_in_user<S, I>(
  state: &AppState<S, I>,
  headers: &HeaderMap,
) -> Result<Option<Uuid>, S::Error>
where
  S: MosaicStore,
{
  let Some(token) = read_cookie(headers, SESSION_COOKIE) else { return Ok(None) };
  let Some(user_id) = state.sessions.resolve(token).await else { return Ok(None) };
  Ok(state.store.get_user(user_id).await?.map(|u| u.user_id))
}

/// Middleware on `/api`: attach [`CurrentUser`] or answer 401.
async fn session_gate<S, I>(
  State(state): State<AppState<S, I>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: MosaicStore,
{
  let signed_in = signed_in_user(&state, req.headers()).await;
  match signed_in {
    Ok(Some(user_id)) => {
      req.extensions_mut().insert(CurrentUser(user_id));
      next.run(req).await
    }
    Ok(None) => ApiError::Unauthorized.into_response(),
    Err(e) => ApiError::store("Error checking session")(e).into_response(),
  }
}

// ─── Sign-in routes ──────────────────────────────────────────────────────────

const LOGIN_PAGE: &str = r#"<!doctype html>
<html>
  <head><title>Memory Mosaic</title></head>
  <body><a href="/auth/google">Login with Google</a></body>
</html>
"#;

/// `GET /` and `GET /login`
async fn index<S, I>(
  State(state): State<AppState<S, I>>,
  headers: HeaderMap,
) -> Result<Response, Error>
where
  S: MosaicStore,
{
  let signed_in = signed_in_user(&state, &headers).await.map_err(Error::store)?;
  Ok(match signed_in {
    Some(_) => Redirect::to("/dashboard").into_response(),
    None => Html(LOGIN_PAGE).into_response(),
  })
}

/// `GET /auth/google` — off to the provider.
async fn login<S, I>(State(state): State<AppState<S, I>>) -> impl IntoResponse
where
  I: IdentityProvider,
{
  let oauth_state = random_token();
  let cookie = set_cookie(
    STATE_COOKIE,
    &oauth_state,
    STATE_COOKIE_MAX_AGE,
    state.config.secure_cookies(),
  );
  (
    AppendHeaders([(header::SET_COOKIE, cookie)]),
    Redirect::to(&state.identity.authorize_url(&oauth_state)),
  )
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
  code:  Option<String>,
  state: Option<String>,
  error: Option<String>,
}

/// `GET /auth/google/callback?code=..&state=..`
async fn callback<S, I>(
  State(state): State<AppState<S, I>>,
  headers: HeaderMap,
  Query(params): Query<CallbackParams>,
) -> Result<Response, Error>
where
  S: MosaicStore,
  I: IdentityProvider,
{
  let expected = read_cookie(&headers, STATE_COOKIE);
  if expected.is_none() || expected != params.state.as_deref() {
    tracing::warn!("rejected sign-in callback with mismatched state");
    return Err(Error::StateMismatch);
  }

  let secure = state.config.secure_cookies();
  let clear_state = clear_cookie(STATE_COOKIE, secure);

  let code = match (params.code, params.error) {
    (Some(code), None) => code,
    (_, error) => {
      tracing::warn!(?error, "identity provider declined sign-in");
      return Ok(
        (AppendHeaders([(header::SET_COOKIE, clear_state)]), Redirect::to("/login"))
          .into_response(),
      );
    }
  };

  let profile = match state.identity.exchange_code(&code).await {
    Ok(profile) => profile,
    Err(e) => {
      tracing::warn!(error = %e, "sign-in code exchange failed");
      return Ok(
        (AppendHeaders([(header::SET_COOKIE, clear_state)]), Redirect::to("/login"))
          .into_response(),
      );
    }
  };

  let user = state.store.create_or_get_user(profile).await.map_err(Error::store)?;
  let token = state.sessions.create(user.user_id).await;
  tracing::info!(user_id = %user.user_id, "user signed in");

  let session = set_cookie(
    SESSION_COOKIE,
    &token,
    state.sessions.ttl().num_seconds(),
    secure,
  );
  Ok(
    (
      AppendHeaders([(header::SET_COOKIE, session), (header::SET_COOKIE, clear_state)]),
      Redirect::to("/dashboard"),
    )
      .into_response(),
  )
}

/// `GET /dashboard` — hand signed-in users over to the frontend.
async fn dashboard<S, I>(
  State(state): State<AppState<S, I>>,
  headers: HeaderMap,
) -> Result<Redirect, Error>
where
  S: MosaicStore,
{
  let signed_in = signed_in_user(&state, &headers).await.map_err(Error::store)?;
  Ok(match signed_in {
    Some(_) => Redirect::to(&format!(
      "{}/Profile",
      state.config.frontend_url.trim_end_matches('/')
    )),
    None => Redirect::to("/auth/google"),
  })
}

/// `GET /logout`
async fn logout<S, I>(
  State(state): State<AppState<S, I>>,
  headers: HeaderMap,
) -> impl IntoResponse {
  if let Some(token) = read_cookie(&headers, SESSION_COOKIE) {
    state.sessions.destroy(token).await;
  }
  (
    AppendHeaders([(
      header::SET_COOKIE,
      clear_cookie(SESSION_COOKIE, state.config.secure_cookies()),
    )]),
    Redirect::to("/"),
  )
}

// ─── Integration tests ────────────────────────────────────────────────────────
