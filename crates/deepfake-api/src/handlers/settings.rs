//! Handlers for a subject's markov settings.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/scopes/{t}/{s}/{u}/settings` | Defaults when none stored |
//! | `PUT`  | `/scopes/{t}/{s}/{u}/settings` | Body: `{"state_size":3,"newline":false}` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use deepfake_core::{settings::MarkovSettings, store::TrainerStore};

use super::{Names, ScopePath, action_context};
use crate::{AppState, auth::BotClient, error::ApiError};

/// `GET /scopes/{t}/{s}/{u}/settings`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
  Query(names): Query<Names>,
) -> Result<Json<MarkovSettings>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let settings = state
    .store
    .settings(action_context(path, names))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(settings))
}

/// `PUT /scopes/{t}/{s}/{u}/settings`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
  Query(names): Query<Names>,
  Json(settings): Json<MarkovSettings>,
) -> Result<Json<MarkovSettings>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  if settings.state_size == 0 {
    return Err(ApiError::BadRequest("state_size must be at least 1".into()));
  }
  state
    .store
    .update_settings(action_context(path, names), settings)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(settings))
}
