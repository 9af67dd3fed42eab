//! Third-party sign-in.
//!
//! [`IdentityProvider`] is the seam between the sign-in routes and the
//! provider. [`GoogleIdentity`] runs the OAuth 2.0 authorization-code flow
//! against Google and reads the OpenID userinfo endpoint.

use std::{future::Future, time::Duration};

use mosaic_core::user::ExternalProfile;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::Error;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// An external identity provider.
pub trait IdentityProvider: Send + Sync {
  /// Where to send the browser to sign in. `state` must come back unchanged
  /// on the callback.
  fn authorize_url(&self, state: &str) -> String;

  /// Trade an authorization code for the signed-in user's profile.
  fn exchange_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<ExternalProfile, Error>> + Send + 'a;
}

// ─── Google ──────────────────────────────────────────────────────────────────

/// Google sign-in with the `profile` and `email` scopes.
#[derive(Clone)]
pub struct GoogleIdentity {
  client:        Client,
  client_id:     String,
  client_secret: String,
  redirect_uri:  String,
  auth_endpoint: Url,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
  sub:     String,
  name:    Option<String>,
  email:   Option<String>,
  picture: Option<String>,
}

impl GoogleIdentity {
  /// `redirect_uri` is the absolute URL of the callback route.
  pub fn new(
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
    redirect_uri: impl Into<String>,
  ) -> Result<Self, Error> {
    let client_id = client_id.into();
    let client_secret = client_secret.into();
    if client_id.is_empty() || client_secret.is_empty() {
      return Err(Error::Config("google_client_id and google_client_secret are required".into()));
    }

    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let auth_endpoint =
      Url::parse(AUTH_ENDPOINT).map_err(|e| Error::Config(e.to_string()))?;

    Ok(Self {
      client,
      client_id,
      client_secret,
      redirect_uri: redirect_uri.into(),
      auth_endpoint,
    })
  }
}

impl IdentityProvider for GoogleIdentity {
  fn authorize_url(&self, state: &str) -> String {
    let mut url = self.auth_endpoint.clone();
    url
      .query_pairs_mut()
      .append_pair("client_id", &self.client_id)
      .append_pair("redirect_uri", &self.redirect_uri)
      .append_pair("response_type", "code")
      .append_pair("scope", "openid profile email")
      .append_pair("state", state);
    url.into()
  }

  async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, Error> {
    let token: TokenResponse = self
      .client
      .post(TOKEN_ENDPOINT)
      .form(&[
        ("code", code),
        ("client_id", self.client_id.as_str()),
        ("client_secret", self.client_secret.as_str()),
        ("redirect_uri", self.redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
      ])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    let info: UserInfo = self
      .client
      .get(USERINFO_ENDPOINT)
      .bearer_auth(&token.access_token)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    profile_from(info)
  }
}

fn profile_from(info: UserInfo) -> Result<ExternalProfile, Error> {
  let email = info
    .email
    .filter(|e| !e.is_empty())
    .ok_or_else(|| Error::Provider("profile has no email address".into()))?;
  // Accounts without a display name fall back to their address.
  let name = info.name.filter(|n| !n.is_empty()).unwrap_or_else(|| email.clone());

  Ok(ExternalProfile {
    external_id: info.sub,
    name,
    email,
    picture_url: info.picture,
  })
}
