//! JSON REST API for the deepfake trainer store.
//!
//! Exposes an axum [`Router`] backed by any [`TrainerStore`]. The chat bot
//! process is the only client and authenticates with HTTP Basic auth on
//! every route except `/health`.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::ApiError;
pub use handlers::deployments::generate_secret_key;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::Request,
  routing::{delete, get, post, put},
};
use deepfake_core::store::TrainerStore;
use serde::Deserialize;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;

use auth::BotCredentials;
use handlers::{
  artifacts, deployments, filters, housekeeping, settings, subjects, trainers,
};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_keepalive_secs() -> u64 { 300 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `DEEPFAKE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  /// Interval between database liveness probes. `0` disables them.
  #[serde(default = "default_keepalive_secs")]
  pub keepalive_secs:     u64,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: TrainerStore> {
  pub store: Arc<S>,
  pub auth:  Arc<BotCredentials>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Trainers
    .route("/trainers", post(trainers::register::<S>))
    .route("/trainers/subscribed", get(trainers::subscribed::<S>))
    .route("/trainers/{user_id}", get(trainers::get_one::<S>))
    .route(
      "/trainers/{user_id}/subscription",
      put(trainers::set_subscription::<S>),
    )
    // Subjects
    .route(
      "/scopes/{trainer}/{server}/{subject}/subject",
      get(subjects::get_one::<S>).put(subjects::register::<S>),
    )
    // Filters
    .route(
      "/scopes/{trainer}/{server}/{subject}/filters",
      get(filters::list::<S>)
        .post(filters::add::<S>)
        .delete(filters::clear::<S>),
    )
    .route(
      "/scopes/{trainer}/{server}/{subject}/filter-batches",
      post(filters::add_many::<S>),
    )
    .route(
      "/scopes/{trainer}/{server}/{subject}/filters/{word}",
      delete(filters::remove::<S>),
    )
    // Settings
    .route(
      "/scopes/{trainer}/{server}/{subject}/settings",
      get(settings::get_one::<S>).put(settings::update::<S>),
    )
    // Artifacts
    .route(
      "/scopes/{trainer}/{server}/{subject}/data-sets",
      post(artifacts::record_data_set::<S>),
    )
    .route(
      "/scopes/{trainer}/{server}/{subject}/data-sets/latest",
      get(artifacts::latest_data_set::<S>),
    )
    .route(
      "/scopes/{trainer}/{server}/{subject}/models/latest",
      get(artifacts::latest_model::<S>),
    )
    .route("/models", post(artifacts::record_model::<S>))
    // Deployments
    .route("/deployments", post(deployments::create::<S>))
    .route("/deployments/{id}", get(deployments::get_one::<S>))
    // Housekeeping
    .route("/statistics", get(housekeeping::statistics::<S>))
    .route("/health", get(housekeeping::health::<S>))
    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
      tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        client = tracing::field::Empty,
      )
    }))
    .with_state(state)
}

// ─── Keepalive ────────────────────────────────────────────────────────────────

/// Ping the store every `every` until the runtime shuts down.
///
/// Failures are logged and the loop keeps going; the next request surfaces
/// a persistent outage as a 500.
pub fn spawn_keepalive<S>(store: Arc<S>, every: Duration) -> JoinHandle<()>
where
  S: TrainerStore + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
      ticker.tick().await;
      match store.ping().await {
        Ok(()) => tracing::debug!("keepalive ok"),
        Err(e) => tracing::warn!(error = %e, "keepalive ping failed"),
      }
    }
  })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
