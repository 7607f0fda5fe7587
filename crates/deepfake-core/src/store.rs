//! The `TrainerStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `deepfake-store-sqlite`). The API layer depends on this abstraction, not
//! on any concrete backend.
//!
//! Every subject-owned read and write takes a whole [`Scope`]; there is no
//! way to address a subject's filters, settings or artifacts by anything
//! less than (trainer, server, subject).

use std::future::Future;

use crate::{
  artifact::{DataSet, Freshness, MarkovModel},
  deployment::Deployment,
  scope::{ActionContext, ExternalId, Scope},
  settings::MarkovSettings,
  stats::Statistics,
  trainer::{Registration, Subject, Trainer},
};

/// Backend errors that can say whether they are one of the domain failures
/// in [`crate::Error`].
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

/// Abstraction over a trainer store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TrainerStore: Send + Sync {
  type Error: StoreError;

  // ── Trainers ──────────────────────────────────────────────────────────

  /// Register a chat user as a trainer if they have not registered before.
  ///
  /// [`Registration::Created`] is returned exactly once per `user_id`; it is
  /// the caller's cue to send the welcome message.
  fn register_trainer(
    &self,
    user_id: ExternalId,
    user_name: String,
  ) -> impl Future<Output = Result<Registration<Trainer>, Self::Error>> + Send + '_;

  fn get_trainer(
    &self,
    user_id: ExternalId,
  ) -> impl Future<Output = Result<Option<Trainer>, Self::Error>> + Send + '_;

  /// Fails with `TrainerNotFound` if the user never registered.
  fn set_subscription(
    &self,
    user_id: ExternalId,
    subscribed: bool,
  ) -> impl Future<Output = Result<Trainer, Self::Error>> + Send + '_;

  /// External ids of every trainer still subscribed to announcements.
  fn subscribed_trainers(
    &self,
  ) -> impl Future<Output = Result<Vec<ExternalId>, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Register the subject addressed by `ctx.scope` if absent. The trainer
  /// must already be registered.
  fn register_subject(
    &self,
    ctx: ActionContext,
  ) -> impl Future<Output = Result<Registration<Subject>, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  // ── Filters ───────────────────────────────────────────────────────────
  //
  // Each of these registers the subject first, so callers never need to.

  /// Returns `true` if the word was inserted, `false` if it was already
  /// there. Both are success.
  fn add_filter(
    &self,
    ctx: ActionContext,
    word: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Insert every word not already present and return those, in input
  /// order.
  fn add_filters(
    &self,
    ctx: ActionContext,
    words: Vec<String>,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Returns whether anything was deleted.
  fn remove_filter(
    &self,
    ctx: ActionContext,
    word: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns the number of filters deleted.
  fn clear_filters(
    &self,
    ctx: ActionContext,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn list_filters(
    &self,
    ctx: ActionContext,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  // ── Markov settings ───────────────────────────────────────────────────

  /// The stored settings, or [`MarkovSettings::default`]. Never writes a
  /// settings row.
  fn settings(
    &self,
    ctx: ActionContext,
  ) -> impl Future<Output = Result<MarkovSettings, Self::Error>> + Send + '_;

  /// Replace the subject's settings, leaving exactly one row.
  fn update_settings(
    &self,
    ctx: ActionContext,
    settings: MarkovSettings,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Artifacts ─────────────────────────────────────────────────────────

  /// Record a freshly collected data set. Does not register the subject:
  /// fails with `SubjectNotFound` if it does not exist.
  fn record_data_set(
    &self,
    scope: Scope,
    data_uid: String,
  ) -> impl Future<Output = Result<DataSet, Self::Error>> + Send + '_;

  fn latest_data_set(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Freshness, Self::Error>> + Send + '_;

  /// Record a model generated from the data set `data_uid`.
  fn record_model(
    &self,
    data_uid: String,
    model_uid: String,
  ) -> impl Future<Output = Result<MarkovModel, Self::Error>> + Send + '_;

  fn latest_model(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Freshness, Self::Error>> + Send + '_;

  // ── Deployments ───────────────────────────────────────────────────────

  /// Record a deployment of `model_uid` for `trainer`. A non-blank
  /// `bot_token` makes it a hosted deployment; both rows are written
  /// atomically.
  fn create_deployment(
    &self,
    trainer: ExternalId,
    model_uid: String,
    secret_key: String,
    bot_token: Option<String>,
  ) -> impl Future<Output = Result<Deployment, Self::Error>> + Send + '_;

  fn get_deployment(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Deployment>, Self::Error>> + Send + '_;

  // ── Housekeeping ──────────────────────────────────────────────────────

  fn statistics(
    &self,
  ) -> impl Future<Output = Result<Statistics, Self::Error>> + Send + '_;

  /// Cheap liveness probe. Must not open a transaction.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
