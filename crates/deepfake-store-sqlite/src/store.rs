//! [`SqliteStore`], the SQLite implementation of [`TrainerStore`].
//!
//! Every multi-step write (check-then-insert, resolve-then-insert,
//! check-then-delete) runs inside one `BEGIN IMMEDIATE` transaction on the
//! connection thread, so the check and the act cannot interleave with another
//! writer. Inserts of idempotent records additionally use
//! `ON CONFLICT DO NOTHING` against the schema's UNIQUE constraints.

use std::{collections::HashSet, path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::{debug, info, warn};

use deepfake_core::{
  artifact::{DataSet, Freshness, MarkovModel},
  deployment::{Deployment, DeploymentKind},
  scope::{ActionContext, ExternalId, Scope},
  settings::MarkovSettings,
  stats::Statistics,
  store::TrainerStore,
  trainer::{Registration, Subject, Trainer},
};

use crate::{
  encode::{
    decode_external_id, encode_dt, encode_external_id, RawArtifact, RawContext,
    RawDeployment, RawScope, RawTrainer,
  },
  schema::SCHEMA,
  Error, Result,
};

/// Source of "now" for timestamps and freshness checks.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A trainer store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. The
/// connection lives on its own thread and is released when the last clone
/// is dropped.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  clock: Clock,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, clock: Arc::new(Utc::now) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, clock: Arc::new(Utc::now) };
    store.init_schema().await?;
    Ok(store)
  }

  /// The same store, reading the time from `clock`.
  pub fn with_clock(
    mut self,
    clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
  ) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  fn now(&self) -> DateTime<Utc> { (self.clock)() }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against the subject addressed by `ctx`, registering the subject
  /// first if needed. Registration and `f` share one transaction.
  async fn with_subject<T, F>(&self, ctx: ActionContext, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>, i64) -> rusqlite::Result<T>
      + Send
      + 'static,
  {
    let trainer = ctx.scope.trainer_id;
    let raw = RawContext::from(ctx);

    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some((subject_id, _)) = ensure_subject(&tx, &raw)? else {
          return Ok(None);
        };
        let value = f(&tx, subject_id)?;
        tx.commit()?;
        Ok(Some(value))
      })
      .await?;

    out.ok_or_else(|| deepfake_core::Error::TrainerNotFound(trainer).into())
  }

  /// Insert an artifact row under a parent resolved inside the same
  /// transaction.
  async fn insert_artifact<R>(
    &self,
    resolve_parent: R,
    insert_sql: &'static str,
    uid: String,
    collected: DateTime<Utc>,
  ) -> Result<Inserted>
  where
    R: FnOnce(&rusqlite::Connection) -> rusqlite::Result<Option<i64>>
      + Send
      + 'static,
  {
    let at = encode_dt(collected);
    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(parent_id) = resolve_parent(&*tx)? else {
          return Ok(Inserted::MissingParent);
        };
        match tx.execute(insert_sql, rusqlite::params![parent_id, at, uid]) {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => return Ok(Inserted::Duplicate),
          Err(e) => return Err(e.into()),
        }
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Inserted::Row { id, parent_id })
      })
      .await?;
    Ok(out)
  }

  /// Execute raw SQL; lets tests set up states the public API refuses to.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT COUNT(*) ...` query.
  #[cfg(test)]
  pub(crate) async fn count_rows(&self, sql: &'static str) -> Result<i64> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(sql, [], |r| r.get(0))?))
        .await?,
    )
  }
}

/// Outcome of [`SqliteStore::insert_artifact`].
enum Inserted {
  Row { id: i64, parent_id: i64 },
  MissingParent,
  Duplicate,
}

// ─── Scoped query helpers ────────────────────────────────────────────────────
//
// These run on the connection thread. Anything addressing a subject goes
// through `subject_in_scope`, which filters on all three scope columns.

/// Row id of the subject addressed by `scope`, if registered.
fn subject_in_scope(
  conn: &rusqlite::Connection,
  scope: RawScope,
) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row(
      "SELECT s.id
       FROM subjects s
       JOIN trainers t ON t.id = s.trainer_id
       WHERE t.user_id = ?1 AND s.server_id = ?2 AND s.user_id = ?3",
      rusqlite::params![scope.trainer, scope.server, scope.subject],
      |r| r.get(0),
    )
    .optional()
}

fn trainer_row_id(
  conn: &rusqlite::Connection,
  user_id: i64,
) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row(
      "SELECT id FROM trainers WHERE user_id = ?1",
      rusqlite::params![user_id],
      |r| r.get(0),
    )
    .optional()
}

/// Insert the subject if absent. Returns `(subject row id, created)`, or
/// `None` when the trainer has not registered.
fn ensure_subject(
  conn: &rusqlite::Connection,
  ctx: &RawContext,
) -> rusqlite::Result<Option<(i64, bool)>> {
  let Some(trainer_id) = trainer_row_id(conn, ctx.scope.trainer)? else {
    return Ok(None);
  };

  let inserted = conn.execute(
    "INSERT INTO subjects (user_id, trainer_id, server_id, server_name, subject_name)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (user_id, server_id, trainer_id) DO NOTHING",
    rusqlite::params![
      ctx.scope.subject,
      trainer_id,
      ctx.scope.server,
      ctx.server_name,
      ctx.subject_name,
    ],
  )?;

  let id: i64 = conn.query_row(
    "SELECT id FROM subjects WHERE user_id = ?1 AND server_id = ?2 AND trainer_id = ?3",
    rusqlite::params![ctx.scope.subject, ctx.scope.server, trainer_id],
    |r| r.get(0),
  )?;

  if inserted == 1 {
    debug!(subject = id, trainer = trainer_id, "registered subject");
  }
  Ok(Some((id, inserted == 1)))
}

fn select_trainer(
  conn: &rusqlite::Connection,
  user_id: i64,
) -> rusqlite::Result<Option<RawTrainer>> {
  conn
    .query_row(
      "SELECT id, user_id, user_name, time_registered, subscribed
       FROM trainers WHERE user_id = ?1",
      rusqlite::params![user_id],
      RawTrainer::from_row,
    )
    .optional()
}

fn select_subject(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Subject> {
  conn.query_row(
    "SELECT s.id, t.user_id, s.server_id, s.user_id, s.subject_name, s.server_name
     FROM subjects s
     JOIN trainers t ON t.id = s.trainer_id
     WHERE s.id = ?1",
    rusqlite::params![id],
    |row| {
      Ok(Subject {
        id:           row.get(0)?,
        scope:        Scope {
          trainer_id: decode_external_id(row.get(1)?),
          server_id:  decode_external_id(row.get(2)?),
          subject_id: decode_external_id(row.get(3)?),
        },
        subject_name: row.get(4)?,
        server_name:  row.get(5)?,
      })
    },
  )
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

fn count(conn: &rusqlite::Connection, sql: &str) -> rusqlite::Result<u64> {
  let n: i64 = conn.query_row(sql, [], |r| r.get(0))?;
  Ok(n.max(0) as u64)
}

// ─── TrainerStore impl ───────────────────────────────────────────────────────

impl TrainerStore for SqliteStore {
  type Error = Error;

  // ── Trainers ──────────────────────────────────────────────────────────────

  async fn register_trainer(
    &self,
    user_id: ExternalId,
    user_name: String,
  ) -> Result<Registration<Trainer>> {
    let uid = encode_external_id(user_id);
    let at = encode_dt(self.now());

    let (created, raw) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
          "INSERT INTO trainers (user_id, user_name, time_registered, subscribed)
           VALUES (?1, ?2, ?3, 1)
           ON CONFLICT (user_id) DO NOTHING",
          rusqlite::params![uid, user_name, at],
        )?;
        let raw = select_trainer(&tx, uid)?;
        tx.commit()?;
        Ok((inserted == 1, raw))
      })
      .await?;

    let trainer = raw
      .ok_or(deepfake_core::Error::TrainerNotFound(user_id))?
      .into_trainer()?;

    if created {
      info!(user = %user_id, "registered trainer");
      Ok(Registration::Created(trainer))
    } else {
      debug!(user = %user_id, "trainer already registered");
      Ok(Registration::Existing(trainer))
    }
  }

  async fn get_trainer(&self, user_id: ExternalId) -> Result<Option<Trainer>> {
    let uid = encode_external_id(user_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_trainer(conn, uid)?))
      .await?;
    raw.map(RawTrainer::into_trainer).transpose()
  }

  async fn set_subscription(
    &self,
    user_id: ExternalId,
    subscribed: bool,
  ) -> Result<Trainer> {
    let uid = encode_external_id(user_id);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "UPDATE trainers SET subscribed = ?2 WHERE user_id = ?1",
          rusqlite::params![uid, subscribed],
        )?;
        let raw = select_trainer(&tx, uid)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw
      .ok_or(deepfake_core::Error::TrainerNotFound(user_id))?
      .into_trainer()
  }

  async fn subscribed_trainers(&self) -> Result<Vec<ExternalId>> {
    let ids: Vec<i64> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT user_id FROM trainers WHERE subscribed = 1 ORDER BY id")?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids.into_iter().map(decode_external_id).collect())
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn register_subject(
    &self,
    ctx: ActionContext,
  ) -> Result<Registration<Subject>> {
    let trainer = ctx.scope.trainer_id;
    let raw = RawContext::from(ctx);

    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some((id, created)) = ensure_subject(&tx, &raw)? else {
          return Ok(None);
        };
        let subject = select_subject(&tx, id)?;
        tx.commit()?;
        Ok(Some((created, subject)))
      })
      .await?;

    match out {
      Some((true, subject)) => Ok(Registration::Created(subject)),
      Some((false, subject)) => Ok(Registration::Existing(subject)),
      None => Err(deepfake_core::Error::TrainerNotFound(trainer).into()),
    }
  }

  async fn get_subject(&self, scope: Scope) -> Result<Option<Subject>> {
    let raw = RawScope::from(scope);
    Ok(
      self
        .conn
        .call(move |conn| {
          subject_in_scope(conn, raw)?
            .map(|id| select_subject(conn, id))
            .transpose()
            .map_err(Into::into)
        })
        .await?,
    )
  }

  // ── Filters ───────────────────────────────────────────────────────────────

  async fn add_filter(&self, ctx: ActionContext, word: String) -> Result<bool> {
    let added = self
      .with_subject(ctx, move |tx, subject_id| {
        let n = tx.execute(
          "INSERT INTO text_filters (subject_id, word) VALUES (?1, ?2)
           ON CONFLICT (subject_id, word) DO NOTHING",
          rusqlite::params![subject_id, word],
        )?;
        Ok(n == 1)
      })
      .await?;
    if !added {
      debug!("filter already present");
    }
    Ok(added)
  }

  async fn add_filters(
    &self,
    ctx: ActionContext,
    words: Vec<String>,
  ) -> Result<Vec<String>> {
    self
      .with_subject(ctx, move |tx, subject_id| {
        let mut present: HashSet<String> = {
          let mut stmt =
            tx.prepare("SELECT word FROM text_filters WHERE subject_id = ?1")?;
          let words = stmt
            .query_map(rusqlite::params![subject_id], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;
          words
        };

        let mut stmt = tx.prepare(
          "INSERT INTO text_filters (subject_id, word) VALUES (?1, ?2)
           ON CONFLICT (subject_id, word) DO NOTHING",
        )?;
        let mut added = Vec::new();
        for word in words {
          // `insert` is false for words already stored and for repeats
          // within `words`.
          if present.insert(word.clone())
            && stmt.execute(rusqlite::params![subject_id, word])? == 1
          {
            added.push(word);
          }
        }
        Ok(added)
      })
      .await
  }

  async fn remove_filter(&self, ctx: ActionContext, word: String) -> Result<bool> {
    self
      .with_subject(ctx, move |tx, subject_id| {
        // The UNIQUE constraint makes this at most one row, but delete every
        // match regardless.
        let n = tx.execute(
          "DELETE FROM text_filters WHERE subject_id = ?1 AND word = ?2",
          rusqlite::params![subject_id, word],
        )?;
        Ok(n > 0)
      })
      .await
  }

  async fn clear_filters(&self, ctx: ActionContext) -> Result<u64> {
    self
      .with_subject(ctx, |tx, subject_id| {
        let n = tx.execute(
          "DELETE FROM text_filters WHERE subject_id = ?1",
          rusqlite::params![subject_id],
        )?;
        Ok(n as u64)
      })
      .await
  }

  async fn list_filters(&self, ctx: ActionContext) -> Result<Vec<String>> {
    self
      .with_subject(ctx, |tx, subject_id| {
        let mut stmt = tx.prepare(
          "SELECT word FROM text_filters WHERE subject_id = ?1 ORDER BY id",
        )?;
        let words = stmt
          .query_map(rusqlite::params![subject_id], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(words)
      })
      .await
  }

  // ── Markov settings ───────────────────────────────────────────────────────

  async fn settings(&self, ctx: ActionContext) -> Result<MarkovSettings> {
    self
      .with_subject(ctx, |tx, subject_id| {
        let mut stmt = tx.prepare(
          "SELECT state_size, newline FROM markov_settings WHERE subject_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![subject_id], |r| {
            Ok(MarkovSettings { state_size: r.get(0)?, newline: r.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(match rows.as_slice() {
          [only] => *only,
          _ => MarkovSettings::default(),
        })
      })
      .await
  }

  async fn update_settings(
    &self,
    ctx: ActionContext,
    settings: MarkovSettings,
  ) -> Result<()> {
    self
      .with_subject(ctx, move |tx, subject_id| {
        let ids = {
          let mut stmt =
            tx.prepare("SELECT id FROM markov_settings WHERE subject_id = ?1")?;
          let ids = stmt
            .query_map(rusqlite::params![subject_id], |r| r.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          ids
        };

        if let [id] = ids.as_slice() {
          tx.execute(
            "UPDATE markov_settings SET state_size = ?2, newline = ?3 WHERE id = ?1",
            rusqlite::params![id, settings.state_size, settings.newline],
          )?;
          return Ok(());
        }

        if ids.len() > 1 {
          warn!(
            subject = subject_id,
            rows = ids.len(),
            "collapsing duplicate markov settings rows"
          );
          tx.execute(
            "DELETE FROM markov_settings WHERE subject_id = ?1",
            rusqlite::params![subject_id],
          )?;
        }
        tx.execute(
          "INSERT INTO markov_settings (subject_id, state_size, newline)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![subject_id, settings.state_size, settings.newline],
        )?;
        Ok(())
      })
      .await
  }

  // ── Artifacts ─────────────────────────────────────────────────────────────

  async fn record_data_set(&self, scope: Scope, data_uid: String) -> Result<DataSet> {
    let raw = RawScope::from(scope);
    let collected = self.now();

    let inserted = self
      .insert_artifact(
        move |conn| subject_in_scope(conn, raw),
        "INSERT INTO data_sets (subject_id, time_collected, data_uid)
         VALUES (?1, ?2, ?3)",
        data_uid.clone(),
        collected,
      )
      .await?;

    match inserted {
      Inserted::Row { id, parent_id } => {
        info!(%scope, uid = %data_uid, "recorded data set");
        Ok(DataSet {
          id,
          subject_id: parent_id,
          time_collected: collected,
          data_uid,
        })
      }
      Inserted::MissingParent => {
        Err(deepfake_core::Error::SubjectNotFound(scope).into())
      }
      Inserted::Duplicate => {
        Err(deepfake_core::Error::DuplicateArtifact(data_uid).into())
      }
    }
  }

  async fn latest_data_set(&self, scope: Scope) -> Result<Freshness> {
    let raw = RawScope::from(scope);

    let latest = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT d.id, d.subject_id, d.time_collected, d.data_uid
               FROM data_sets d
               JOIN subjects s ON s.id = d.subject_id
               JOIN trainers t ON t.id = s.trainer_id
               WHERE t.user_id = ?1 AND s.server_id = ?2 AND s.user_id = ?3
               ORDER BY d.id DESC
               LIMIT 1",
              rusqlite::params![raw.trainer, raw.server, raw.subject],
              RawArtifact::from_row,
            )
            .optional()?,
        )
      })
      .await?
      .map(RawArtifact::into_data_set)
      .transpose()?;

    Ok(Freshness::classify(latest.as_ref(), self.now()))
  }

  async fn record_model(
    &self,
    data_uid: String,
    model_uid: String,
  ) -> Result<MarkovModel> {
    let collected = self.now();
    let lookup_uid = data_uid.clone();

    let inserted = self
      .insert_artifact(
        move |conn| {
          conn
            .query_row(
              "SELECT id FROM data_sets WHERE data_uid = ?1",
              rusqlite::params![lookup_uid],
              |r| r.get(0),
            )
            .optional()
        },
        "INSERT INTO markov_models (data_set_id, time_collected, model_uid)
         VALUES (?1, ?2, ?3)",
        model_uid.clone(),
        collected,
      )
      .await?;

    match inserted {
      Inserted::Row { id, parent_id } => {
        info!(data = %data_uid, uid = %model_uid, "recorded markov model");
        Ok(MarkovModel {
          id,
          data_set_id: parent_id,
          time_collected: collected,
          model_uid,
        })
      }
      Inserted::MissingParent => {
        Err(deepfake_core::Error::DataSetNotFound(data_uid).into())
      }
      Inserted::Duplicate => {
        Err(deepfake_core::Error::DuplicateArtifact(model_uid).into())
      }
    }
  }

  async fn latest_model(&self, scope: Scope) -> Result<Freshness> {
    let raw = RawScope::from(scope);

    let latest = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT m.id, m.data_set_id, m.time_collected, m.model_uid
               FROM markov_models m
               JOIN data_sets d ON d.id = m.data_set_id
               JOIN subjects  s ON s.id = d.subject_id
               JOIN trainers  t ON t.id = s.trainer_id
               WHERE t.user_id = ?1 AND s.server_id = ?2 AND s.user_id = ?3
               ORDER BY m.id DESC
               LIMIT 1",
              rusqlite::params![raw.trainer, raw.server, raw.subject],
              RawArtifact::from_row,
            )
            .optional()?,
        )
      })
      .await?
      .map(RawArtifact::into_model)
      .transpose()?;

    Ok(Freshness::classify(latest.as_ref(), self.now()))
  }

  // ── Deployments ───────────────────────────────────────────────────────────

  async fn create_deployment(
    &self,
    trainer: ExternalId,
    model_uid: String,
    secret_key: String,
    bot_token: Option<String>,
  ) -> Result<Deployment> {
    let kind = DeploymentKind::from_token(bot_token.as_deref());
    let hosted = kind.hosted_config().cloned();
    let trainer_uid = encode_external_id(trainer);
    let lookup_uid = model_uid.clone();
    let key = secret_key.clone();

    let out = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let markov_id: Option<i64> = tx
          .query_row(
            "SELECT id FROM markov_models WHERE model_uid = ?1",
            rusqlite::params![lookup_uid],
            |r| r.get(0),
          )
          .optional()?;
        let Some(markov_id) = markov_id else {
          return Ok(Err(MissingForDeployment::Model));
        };
        let Some(trainer_id) = trainer_row_id(&tx, trainer_uid)? else {
          return Ok(Err(MissingForDeployment::Trainer));
        };

        tx.execute(
          "INSERT INTO deployments (secret_key, markov_id, trainer_id, hosted)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![key, markov_id, trainer_id, hosted.is_some()],
        )?;
        let id = tx.last_insert_rowid();

        if let Some(cfg) = &hosted {
          tx.execute(
            "INSERT INTO hosted_deployments (
               deployment_id, ip_address, active, reply_probability,
               new_conversation_min_wait, new_conversation_max_wait,
               max_sentence_length, quiet_mode, bot_token
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
              id,
              cfg.ip_address,
              cfg.active,
              cfg.reply_probability,
              cfg.new_conversation_min_wait,
              cfg.new_conversation_max_wait,
              cfg.max_sentence_length,
              cfg.quiet_mode,
              cfg.bot_token,
            ],
          )?;
        }

        tx.commit()?;
        Ok(Ok((id, markov_id, trainer_id)))
      })
      .await?;

    match out {
      Ok((id, markov_id, trainer_id)) => {
        info!(deployment = id, hosted = kind.is_hosted(), "created deployment");
        Ok(Deployment { id, secret_key, markov_id, trainer_id, kind })
      }
      Err(MissingForDeployment::Model) => {
        Err(deepfake_core::Error::ModelNotFound(model_uid).into())
      }
      Err(MissingForDeployment::Trainer) => {
        Err(deepfake_core::Error::TrainerNotFound(trainer).into())
      }
    }
  }

  async fn get_deployment(&self, id: i64) -> Result<Option<Deployment>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT d.id, d.secret_key, d.markov_id, d.trainer_id, d.hosted,
                      h.ip_address, h.active, h.reply_probability,
                      h.new_conversation_min_wait, h.new_conversation_max_wait,
                      h.max_sentence_length, h.quiet_mode, h.bot_token
               FROM deployments d
               LEFT JOIN hosted_deployments h ON h.deployment_id = d.id
               WHERE d.id = ?1",
              rusqlite::params![id],
              RawDeployment::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawDeployment::into_deployment).transpose()
  }

  // ── Housekeeping ──────────────────────────────────────────────────────────

  async fn statistics(&self) -> Result<Statistics> {
    Ok(
      self
        .conn
        .call(|conn| {
          Ok(Statistics {
            version:          env!("CARGO_PKG_VERSION").to_owned(),
            registered_users: count(conn, "SELECT COUNT(*) FROM trainers")?,
            model_subjects:   count(conn, "SELECT COUNT(DISTINCT user_id) FROM subjects")?,
            servers:          count(conn, "SELECT COUNT(DISTINCT server_id) FROM subjects")?,
            data_sets:        count(conn, "SELECT COUNT(*) FROM data_sets")?,
            filters_applied:  count(conn, "SELECT COUNT(*) FROM text_filters")?,
            markov_models:    count(conn, "SELECT COUNT(*) FROM markov_models")?,
            bots_deployed:    count(conn, "SELECT COUNT(*) FROM deployments")?,
          })
        })
        .await?,
    )
  }

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

enum MissingForDeployment {
  Model,
  Trainer,
}
