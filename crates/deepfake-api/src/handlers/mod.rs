//! Route handlers, one module per resource.

pub mod artifacts;
pub mod deployments;
pub mod filters;
pub mod housekeeping;
pub mod settings;
pub mod subjects;
pub mod trainers;

use deepfake_core::scope::{ActionContext, ExternalId, Scope};
use serde::Deserialize;

/// `/scopes/{trainer}/{server}/{subject}` path segments.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScopePath {
  pub trainer: ExternalId,
  pub server:  ExternalId,
  pub subject: ExternalId,
}

impl From<ScopePath> for Scope {
  fn from(p: ScopePath) -> Self {
    Scope { trainer_id: p.trainer, server_id: p.server, subject_id: p.subject }
  }
}

/// Display names sent alongside subject-scoped requests so the subject can be
/// registered on first reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Names {
  #[serde(default)]
  pub subject_name: String,
  #[serde(default)]
  pub server_name:  String,
}

pub(crate) fn action_context(path: ScopePath, names: Names) -> ActionContext {
  ActionContext::new(path.into(), names.subject_name, names.server_name)
}
