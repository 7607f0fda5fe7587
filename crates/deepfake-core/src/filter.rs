//! The rule every text-filter word must pass.

use crate::{Error, Result};

/// Longest filter word accepted from the chat boundary, in characters.
pub const MAX_FILTER_LEN: usize = 255;

/// Reject words the store should never see.
pub fn validate_filter_word(word: &str) -> Result<()> {
  if word.is_empty() {
    return Err(Error::InvalidFilter("filter word is empty".into()));
  }
  let len = word.chars().count();
  if len > MAX_FILTER_LEN {
    return Err(Error::InvalidFilter(format!(
      "filters need to be {MAX_FILTER_LEN} characters or less (got {len})"
    )));
  }
  Ok(())
}
