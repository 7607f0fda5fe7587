//! Data sets, markov models, and the freshness window both share.
//!
//! Artifacts are immutable once recorded. They never get deleted; instead
//! they expire logically once they are older than the freshness window, and
//! lookups report that distinctly from "never recorded".

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Artifacts collected this many days ago or earlier are expired.
pub const FRESHNESS_WINDOW_DAYS: i64 = 30;

pub fn freshness_window() -> TimeDelta { TimeDelta::days(FRESHNESS_WINDOW_DAYS) }

/// An opaque collected-message artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSet {
  pub id:             i64,
  pub subject_id:     i64,
  pub time_collected: DateTime<Utc>,
  pub data_uid:       String,
}

/// An opaque generative artifact derived from one data set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkovModel {
  pub id:             i64,
  pub data_set_id:    i64,
  pub time_collected: DateTime<Utc>,
  pub model_uid:      String,
}

/// Anything the freshness window applies to.
pub trait Artifact {
  fn uid(&self) -> &str;
  fn collected_at(&self) -> DateTime<Utc>;
}

impl Artifact for DataSet {
  fn uid(&self) -> &str { &self.data_uid }
  fn collected_at(&self) -> DateTime<Utc> { self.time_collected }
}

impl Artifact for MarkovModel {
  fn uid(&self) -> &str { &self.model_uid }
  fn collected_at(&self) -> DateTime<Utc> { self.time_collected }
}

/// Result of looking up the latest artifact for a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Freshness {
  Fresh {
    uid:          String,
    collected_at: DateTime<Utc>,
  },
  /// An artifact exists but is too old; the caller should regenerate it.
  Expired {
    uid:          String,
    collected_at: DateTime<Utc>,
  },
  /// Nothing has been recorded for the scope.
  Absent,
}

impl Freshness {
  /// Apply the freshness window to the latest artifact (if any) as of `now`.
  pub fn classify<A: Artifact>(latest: Option<&A>, now: DateTime<Utc>) -> Self {
    let Some(artifact) = latest else {
      return Self::Absent;
    };
    let uid = artifact.uid().to_owned();
    let collected_at = artifact.collected_at();
    if now - collected_at < freshness_window() {
      Self::Fresh { uid, collected_at }
    } else {
      Self::Expired { uid, collected_at }
    }
  }

  /// The uid, only when fresh.
  pub fn fresh_uid(&self) -> Option<&str> {
    match self {
      Self::Fresh { uid, .. } => Some(uid),
      _ => None,
    }
  }

  pub fn is_expired(&self) -> bool { matches!(self, Self::Expired { .. }) }

  pub fn is_absent(&self) -> bool { matches!(self, Self::Absent) }
}
