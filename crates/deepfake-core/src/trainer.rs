//! Trainers and the subjects they own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scope::{ExternalId, Scope};

/// Sent once, the first time a chat user registers as a trainer.
pub const WELCOME_MESSAGE: &str = "Thank you for using me! You've taken the \
  first step towards creating a copy of one or more of your friends. I \
  recommend having a look at my documentation when you get a chance: \
  https://deepfake-bot.readthedocs.io/en/latest/";

/// A registered end-user. Created once per external identity and never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trainer {
  pub id:              i64,
  pub user_id:         ExternalId,
  pub user_name:       String,
  pub time_registered: DateTime<Utc>,
  pub subscribed:      bool,
}

/// A chat participant being modelled, scoped per trainer per server.
///
/// The same person is a distinct subject for every (trainer, server) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id:           i64,
  pub scope:        Scope,
  pub subject_name: String,
  pub server_name:  String,
}

/// Outcome of an insert-if-absent registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum Registration<T> {
  /// The row did not exist and was inserted by this call.
  Created(T),
  /// The row already existed; nothing was written.
  Existing(T),
}

impl<T> Registration<T> {
  pub fn is_created(&self) -> bool { matches!(self, Self::Created(_)) }

  pub fn get(&self) -> &T {
    match self {
      Self::Created(t) | Self::Existing(t) => t,
    }
  }

  pub fn into_inner(self) -> T {
    match self {
      Self::Created(t) | Self::Existing(t) => t,
    }
  }
}

impl Registration<Trainer> {
  /// The one-time welcome notification, present only on first registration.
  pub fn welcome(&self) -> Option<&'static str> {
    self.is_created().then_some(WELCOME_MESSAGE)
  }
}
