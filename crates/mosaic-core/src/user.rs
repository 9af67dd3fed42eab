//! Users — identities asserted by the external OAuth provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account holder. Created on first login and never deleted by the
/// application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  #[serde(rename = "_id")]
  pub user_id:         Uuid,
  /// The provider's stable subject identifier (Google `sub`).
  pub external_id:     String,
  pub name:            String,
  pub email:           String,
  pub profile_picture: Option<String>,
  /// Ids of the people this user owns, in insertion order.
  pub people:          Vec<Uuid>,
  pub created_at:      DateTime<Utc>,
}

/// An identity assertion produced by the OAuth collaborator.
///
/// The store trusts it as-is; token validation happens before one of these is
/// ever built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
  pub external_id: String,
  pub name:        String,
  pub email:       String,
  pub picture_url: Option<String>,
}
