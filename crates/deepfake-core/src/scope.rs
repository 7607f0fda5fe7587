//! Ownership scoping.
//!
//! Every piece of subject-owned data is addressed by the triple
//! (trainer, server, subject). Dropping any one of the three from a lookup
//! would leak one trainer's data to another, so the triple only ever travels
//! as a single [`Scope`] value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An identifier issued by the chat platform (a user, guild or member
/// snowflake).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct ExternalId(pub u64);

impl fmt::Display for ExternalId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<u64> for ExternalId {
  fn from(id: u64) -> Self { Self(id) }
}

/// The (trainer, server, subject) triple every subject-scoped lookup filters
/// on.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Scope {
  /// The trainer issuing the action.
  pub trainer_id: ExternalId,
  /// The server (guild) the action happens on.
  pub server_id:  ExternalId,
  /// The chat participant being modelled.
  pub subject_id: ExternalId,
}

impl Scope {
  pub fn new(
    trainer_id: impl Into<ExternalId>,
    server_id: impl Into<ExternalId>,
    subject_id: impl Into<ExternalId>,
  ) -> Self {
    Self {
      trainer_id: trainer_id.into(),
      server_id:  server_id.into(),
      subject_id: subject_id.into(),
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "trainer={} server={} subject={}",
      self.trainer_id, self.server_id, self.subject_id
    )
  }
}

/// What the chat client knows about an inbound action. Carries the display
/// names needed to register the subject lazily on first reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionContext {
  pub scope:        Scope,
  pub subject_name: String,
  pub server_name:  String,
}

impl ActionContext {
  pub fn new(
    scope: Scope,
    subject_name: impl Into<String>,
    server_name: impl Into<String>,
  ) -> Self {
    Self {
      scope,
      subject_name: subject_name.into(),
      server_name: server_name.into(),
    }
  }
}
