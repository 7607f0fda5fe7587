//! Markov chain generation settings, at most one row per subject.

use serde::{Deserialize, Serialize};

/// Generation settings for a subject. [`Default`] is what a subject without
/// a stored row gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkovSettings {
  pub state_size: u32,
  pub newline:    bool,
}

impl Default for MarkovSettings {
  fn default() -> Self { Self { state_size: 3, newline: false } }
}
