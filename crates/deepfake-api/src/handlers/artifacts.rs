//! Handlers for data sets and markov models.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/scopes/{t}/{s}/{u}/data-sets` | Body: `{"uid":"..."}`; subject must exist |
//! | `GET`  | `/scopes/{t}/{s}/{u}/data-sets/latest` | [`Freshness`] |
//! | `GET`  | `/scopes/{t}/{s}/{u}/models/latest` | [`Freshness`] |
//! | `POST` | `/models` | Body: `{"data_set_uid":"...","model_uid":"..."}` |
//!
//! Lookups always answer 200 with a `status` of `fresh`, `expired` or
//! `absent`; the chat client words its reply from that.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use deepfake_core::{
  artifact::{DataSet, Freshness, MarkovModel},
  store::TrainerStore,
};
use serde::Deserialize;

use super::ScopePath;
use crate::{AppState, auth::BotClient, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct DataSetBody {
  pub uid: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelBody {
  pub data_set_uid: String,
  pub model_uid:    String,
}

/// `POST /scopes/{t}/{s}/{u}/data-sets`
pub async fn record_data_set<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
  Json(body): Json<DataSetBody>,
) -> Result<(StatusCode, Json<DataSet>), ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let data_set = state
    .store
    .record_data_set(path.into(), body.uid)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(data_set)))
}

/// `GET /scopes/{t}/{s}/{u}/data-sets/latest`
pub async fn latest_data_set<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
) -> Result<Json<Freshness>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let freshness = state
    .store
    .latest_data_set(path.into())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(freshness))
}

/// `POST /models`
pub async fn record_model<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Json(body): Json<ModelBody>,
) -> Result<(StatusCode, Json<MarkovModel>), ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let model = state
    .store
    .record_model(body.data_set_uid, body.model_uid)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(model)))
}

/// `GET /scopes/{t}/{s}/{u}/models/latest`
pub async fn latest_model<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
) -> Result<Json<Freshness>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let freshness = state
    .store
    .latest_model(path.into())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(freshness))
}
