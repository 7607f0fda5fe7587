//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. External ids are unsigned
//! 64-bit snowflakes stored bit-for-bit in SQLite's signed INTEGER.

use chrono::{DateTime, Utc};
use deepfake_core::{
  artifact::{DataSet, MarkovModel},
  deployment::{Deployment, DeploymentKind, HostedConfig},
  scope::{ActionContext, ExternalId, Scope},
  trainer::Trainer,
};

use crate::{Error, Result};

// ─── ExternalId ──────────────────────────────────────────────────────────────

pub fn encode_external_id(id: ExternalId) -> i64 { id.0 as i64 }

pub fn decode_external_id(v: i64) -> ExternalId { ExternalId(v as u64) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// A [`Scope`] as the three INTEGER column values it is matched against.
#[derive(Debug, Clone, Copy)]
pub struct RawScope {
  pub trainer: i64,
  pub server:  i64,
  pub subject: i64,
}

impl From<Scope> for RawScope {
  fn from(scope: Scope) -> Self {
    Self {
      trainer: encode_external_id(scope.trainer_id),
      server:  encode_external_id(scope.server_id),
      subject: encode_external_id(scope.subject_id),
    }
  }
}

/// An [`ActionContext`] ready to be moved onto the database thread.
#[derive(Debug, Clone)]
pub struct RawContext {
  pub scope:        RawScope,
  pub subject_name: String,
  pub server_name:  String,
}

impl From<ActionContext> for RawContext {
  fn from(ctx: ActionContext) -> Self {
    Self {
      scope:        ctx.scope.into(),
      subject_name: ctx.subject_name,
      server_name:  ctx.server_name,
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns of a `trainers` row, in `SELECT id, user_id, user_name,
/// time_registered, subscribed` order.
pub struct RawTrainer {
  pub id:              i64,
  pub user_id:         i64,
  pub user_name:       String,
  pub time_registered: String,
  pub subscribed:      bool,
}

impl RawTrainer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      user_id:         row.get(1)?,
      user_name:       row.get(2)?,
      time_registered: row.get(3)?,
      subscribed:      row.get(4)?,
    })
  }

  pub fn into_trainer(self) -> Result<Trainer> {
    Ok(Trainer {
      id:              self.id,
      user_id:         decode_external_id(self.user_id),
      user_name:       self.user_name,
      time_registered: decode_dt(&self.time_registered)?,
      subscribed:      self.subscribed,
    })
  }
}

/// Columns shared by `data_sets` and `markov_models`: id, parent id,
/// collection time, uid.
pub struct RawArtifact {
  pub id:             i64,
  pub parent_id:      i64,
  pub time_collected: String,
  pub uid:            String,
}

impl RawArtifact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      parent_id:      row.get(1)?,
      time_collected: row.get(2)?,
      uid:            row.get(3)?,
    })
  }

  pub fn into_data_set(self) -> Result<DataSet> {
    Ok(DataSet {
      id:             self.id,
      subject_id:     self.parent_id,
      time_collected: decode_dt(&self.time_collected)?,
      data_uid:       self.uid,
    })
  }

  pub fn into_model(self) -> Result<MarkovModel> {
    Ok(MarkovModel {
      id:             self.id,
      data_set_id:    self.parent_id,
      time_collected: decode_dt(&self.time_collected)?,
      model_uid:      self.uid,
    })
  }
}

/// A `deployments` row left-joined with its `hosted_deployments` row.
pub struct RawDeployment {
  pub id:         i64,
  pub secret_key: String,
  pub markov_id:  i64,
  pub trainer_id: i64,
  pub hosted:     bool,
  // hosted_deployments join
  pub ip_address:                Option<String>,
  pub active:                    Option<bool>,
  pub reply_probability:         Option<f64>,
  pub new_conversation_min_wait: Option<u32>,
  pub new_conversation_max_wait: Option<u32>,
  pub max_sentence_length:       Option<u32>,
  pub quiet_mode:                Option<bool>,
  pub bot_token:                 Option<String>,
}

impl RawDeployment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                        row.get(0)?,
      secret_key:                row.get(1)?,
      markov_id:                 row.get(2)?,
      trainer_id:                row.get(3)?,
      hosted:                    row.get(4)?,
      ip_address:                row.get(5)?,
      active:                    row.get(6)?,
      reply_probability:         row.get(7)?,
      new_conversation_min_wait: row.get(8)?,
      new_conversation_max_wait: row.get(9)?,
      max_sentence_length:       row.get(10)?,
      quiet_mode:                row.get(11)?,
      bot_token:                 row.get(12)?,
    })
  }

  pub fn into_deployment(self) -> Result<Deployment> {
    let kind = if self.hosted {
      let missing = || {
        Error::Inconsistent(format!(
          "deployment {} is hosted but has no hosting config",
          self.id
        ))
      };
      DeploymentKind::Hosted(HostedConfig {
        ip_address:                self.ip_address.clone().ok_or_else(missing)?,
        active:                    self.active.ok_or_else(missing)?,
        reply_probability:         self.reply_probability.ok_or_else(missing)?,
        new_conversation_min_wait: self
          .new_conversation_min_wait
          .ok_or_else(missing)?,
        new_conversation_max_wait: self
          .new_conversation_max_wait
          .ok_or_else(missing)?,
        max_sentence_length:       self.max_sentence_length.ok_or_else(missing)?,
        quiet_mode:                self.quiet_mode.ok_or_else(missing)?,
        bot_token:                 self.bot_token.clone().ok_or_else(missing)?,
      })
    } else {
      DeploymentKind::SelfHosted
    };

    Ok(Deployment {
      id: self.id,
      secret_key: self.secret_key,
      markov_id: self.markov_id,
      trainer_id: self.trainer_id,
      kind,
    })
  }
}
