//! Cookie sessions.
//!
//! A session is a random bearer token handed to the browser in an `HttpOnly`
//! cookie. The server keeps only a keyed SHA-256 digest of each token, so the
//! in-memory table cannot be replayed on its own.

use std::collections::HashMap;

use axum::http::{HeaderMap, header::COOKIE};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "mosaic_session";
/// Cookie carrying the OAuth `state` between redirect and callback.
pub const STATE_COOKIE: &str = "mosaic_oauth_state";
/// Lifetime of [`STATE_COOKIE`], in seconds.
pub const STATE_COOKIE_MAX_AGE: i64 = 10 * 60;

struct Session {
  user_id:    Uuid,
  expires_at: DateTime<Utc>,
}

/// In-process session table.
pub struct SessionStore {
  secret:   String,
  ttl:      Duration,
  sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
  pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
    Self { secret: secret.into(), ttl, sessions: RwLock::new(HashMap::new()) }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  fn key(&self, token: &str) -> String {
    hex::encode(
      Sha256::new()
        .chain_update(self.secret.as_bytes())
        .chain_update(token.as_bytes())
        .finalize(),
    )
  }

  /// Start a session for `user_id` and return its token.
  pub async fn create(&self, user_id: Uuid) -> String {
    let token = random_token();
    let now = Utc::now();
    let session = Session { user_id, expires_at: now + self.ttl };

    let mut sessions = self.sessions.write().await;
    sessions.retain(|_, s| s.expires_at > now);
    sessions.insert(self.key(&token), session);
    token
  }

  /// The user behind `token`, if the session exists and has not expired.
  pub async fn resolve(&self, token: &str) -> Option<Uuid> {
    let key = self.key(token);
    {
      let sessions = self.sessions.read().await;
      match sessions.get(&key) {
        None => return None,
        Some(s) if s.expires_at > Utc::now() => return Some(s.user_id),
        Some(_) => {}
      }
    }
    self.sessions.write().await.remove(&key);
    None
  }

  pub async fn destroy(&self, token: &str) {
    self.sessions.write().await.remove(&self.key(token));
  }
}

/// 32 random bytes, base64url without padding.
pub fn random_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get_all(COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, _)| *k == name)
    .map(|(_, v)| v)
}

/// A `Set-Cookie` value for an `HttpOnly`, `SameSite=Lax` cookie on `/`.
pub fn set_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
  let mut cookie =
    format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
  if secure {
    cookie.push_str("; Secure");
  }
  cookie
}

pub fn clear_cookie(name: &str, secure: bool) -> String { set_cookie(name, "", 0, secure) }
