//! Error types for `deepfake-core`.

use thiserror::Error;

use crate::scope::{ExternalId, Scope};

#[derive(Debug, Error)]
pub enum Error {
  #[error("trainer not registered: {0}")]
  TrainerNotFound(ExternalId),

  #[error("subject not found for {0}")]
  SubjectNotFound(Scope),

  #[error("data set not found: {0:?}")]
  DataSetNotFound(String),

  #[error("markov model not found: {0:?}")]
  ModelNotFound(String),

  #[error("artifact uid already recorded: {0:?}")]
  DuplicateArtifact(String),

  #[error("invalid filter: {0}")]
  InvalidFilter(String),
}

impl Error {
  /// True for the "a required row does not exist" family.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::TrainerNotFound(_)
        | Self::SubjectNotFound(_)
        | Self::DataSetNotFound(_)
        | Self::ModelNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
