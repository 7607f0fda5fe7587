//! Whole-store record counts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
  pub version:          String,
  pub registered_users: u64,
  /// Distinct chat users modelled, across all trainers and servers.
  pub model_subjects:   u64,
  pub servers:          u64,
  pub data_sets:        u64,
  pub filters_applied:  u64,
  pub markov_models:    u64,
  pub bots_deployed:    u64,
}
