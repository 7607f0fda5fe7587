//! `GET /statistics` and the unauthenticated `GET /health` probe.

use axum::{Json, extract::State, http::StatusCode};
use deepfake_core::{stats::Statistics, store::TrainerStore};

use crate::{AppState, auth::BotClient, error::ApiError};

/// `GET /statistics`
pub async fn statistics<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
) -> Result<Json<Statistics>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let stats = state
    .store
    .statistics()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(stats))
}

/// `GET /health`: 204 when the database answers.
pub async fn health<S>(State(state): State<AppState<S>>) -> Result<StatusCode, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  state.store.ping().await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
