//! People, memories, and comments — the Person document.
//!
//! A [`Person`] is stored as a single document. Memories are embedded in the
//! person and comments are embedded in their memory, so removing a container
//! removes everything inside it and no comment can outlive its memory.
//!
//! Field names on the wire keep the document-store shape (`_id`, camelCase).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::input::{MemoryPatch, NewComment, NewMemory, NewPerson};

/// A free-text annotation on a memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  #[serde(rename = "_id")]
  pub comment_id: Uuid,
  pub text:       String,
  #[serde(rename = "date")]
  pub created_at: DateTime<Utc>,
}

/// A titled, photo-bearing event belonging to one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
  #[serde(rename = "_id")]
  pub memory_id:  Uuid,
  pub title:      String,
  /// URL of the stored photo.
  pub photo:      String,
  pub comments:   Vec<Comment>,
  #[serde(rename = "date")]
  pub created_at: DateTime<Utc>,
}

/// A named individual owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
  #[serde(rename = "_id")]
  pub person_id:       Uuid,
  /// The owning user.
  #[serde(rename = "user")]
  pub user_id:         Uuid,
  pub name:            String,
  pub profile_picture: Option<String>,
  pub memories:        Vec<Memory>,
  pub created_at:      DateTime<Utc>,
}

impl Comment {
  fn create(input: NewComment, now: DateTime<Utc>) -> Self {
    Self { comment_id: Uuid::new_v4(), text: input.text, created_at: now }
  }
}

impl Person {
  /// Build a fresh person with no memories.
  pub fn create(user_id: Uuid, input: NewPerson, now: DateTime<Utc>) -> Self {
    Self {
      person_id: Uuid::new_v4(),
      user_id,
      name: input.name,
      profile_picture: input.profile_picture,
      memories: Vec::new(),
      created_at: now,
    }
  }

  pub fn memory(&self, memory_id: Uuid) -> Option<&Memory> {
    self.memories.iter().find(|m| m.memory_id == memory_id)
  }

  fn memory_mut(&mut self, memory_id: Uuid) -> Option<&mut Memory> {
    self.memories.iter_mut().find(|m| m.memory_id == memory_id)
  }

  pub fn set_profile_picture(&mut self, url: String) {
    self.profile_picture = Some(url);
  }

  /// Append a memory, with its optional first comment.
  pub fn push_memory(&mut self, input: NewMemory, now: DateTime<Utc>) -> &Memory {
    let comments = input
      .comment
      .map(|text| vec![Comment::create(NewComment { text }, now)])
      .unwrap_or_default();

    self.memories.push(Memory {
      memory_id: Uuid::new_v4(),
      title: input.title,
      photo: input.photo,
      comments,
      created_at: now,
    });
    &self.memories[self.memories.len() - 1]
  }

  /// Remove a memory together with all of its comments.
  pub fn remove_memory(&mut self, memory_id: Uuid) -> Option<Memory> {
    let index = self.memories.iter().position(|m| m.memory_id == memory_id)?;
    Some(self.memories.remove(index))
  }

  /// Append a comment to a memory. `None` if the memory does not exist.
  pub fn push_comment(
    &mut self,
    memory_id: Uuid,
    input: NewComment,
    now: DateTime<Utc>,
  ) -> Option<&Memory> {
    let memory = self.memory_mut(memory_id)?;
    memory.comments.push(Comment::create(input, now));
    Some(&*memory)
  }

  /// Apply a partial update to a memory. `None` if the memory does not exist.
  pub fn apply_patch(
    &mut self,
    memory_id: Uuid,
    patch: MemoryPatch,
    now: DateTime<Utc>,
  ) -> Option<&Memory> {
    let memory = self.memory_mut(memory_id)?;
    if let Some(title) = patch.title {
      memory.title = title;
    }
    if let Some(photo) = patch.photo {
      memory.photo = photo;
    }
    if let Some(text) = patch.comment {
      memory.comments.push(Comment::create(NewComment { text }, now));
    }
    Some(&*memory)
  }
}
