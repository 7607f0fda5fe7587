//! Handlers for a subject's text filters.
//!
//! All routes take the subject's display names as query parameters
//! (`?subject_name=..&server_name=..`) so the subject can be registered
//! lazily.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/scopes/{t}/{s}/{u}/filters` | Words in insertion order |
//! | `POST`   | `/scopes/{t}/{s}/{u}/filters` | Body: `{"word":"x"}` |
//! | `POST`   | `/scopes/{t}/{s}/{u}/filter-batches` | Body: `{"words":["x","y"]}`; returns the words actually added |
//! | `DELETE` | `/scopes/{t}/{s}/{u}/filters/{word}` | `{"removed":false}` if absent |
//! | `DELETE` | `/scopes/{t}/{s}/{u}/filters` | Clears every filter |
//!
//! Words are checked against [`validate_filter_word`] here, before they
//! reach the store.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use deepfake_core::{
  filter::validate_filter_word, scope::ExternalId, store::TrainerStore,
};
use serde::{Deserialize, Serialize};

use super::{Names, ScopePath, action_context};
use crate::{AppState, auth::BotClient, error::ApiError};

/// `/scopes/{trainer}/{server}/{subject}/filters/{word}` path segments.
#[derive(Debug, Deserialize)]
pub struct WordPath {
  pub trainer: ExternalId,
  pub server:  ExternalId,
  pub subject: ExternalId,
  pub word:    String,
}

impl WordPath {
  fn split(self) -> (ScopePath, String) {
    let scope = ScopePath {
      trainer: self.trainer,
      server:  self.server,
      subject: self.subject,
    };
    (scope, self.word)
  }
}

#[derive(Debug, Deserialize)]
pub struct AddBody {
  pub word: String,
}

#[derive(Debug, Deserialize)]
pub struct AddManyBody {
  pub words: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Added {
  pub added: bool,
}

#[derive(Debug, Serialize)]
pub struct AddedWords {
  pub added: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Removed {
  pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct Cleared {
  pub removed: u64,
}

#[derive(Debug, Serialize)]
pub struct Words {
  pub words: Vec<String>,
}

/// `GET /scopes/{t}/{s}/{u}/filters`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
  Query(names): Query<Names>,
) -> Result<Json<Words>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let words = state
    .store
    .list_filters(action_context(path, names))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Words { words }))
}

/// `POST /scopes/{t}/{s}/{u}/filters`
pub async fn add<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
  Query(names): Query<Names>,
  Json(body): Json<AddBody>,
) -> Result<Json<Added>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  validate_filter_word(&body.word)?;
  let added = state
    .store
    .add_filter(action_context(path, names), body.word)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Added { added }))
}

/// `POST /scopes/{t}/{s}/{u}/filter-batches`
pub async fn add_many<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
  Query(names): Query<Names>,
  Json(body): Json<AddManyBody>,
) -> Result<Json<AddedWords>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  for word in &body.words {
    validate_filter_word(word)?;
  }
  let added = state
    .store
    .add_filters(action_context(path, names), body.words)
    .await
    .map_err(ApiError::from_store)?;
  tracing::debug!(count = added.len(), "added filters");
  Ok(Json(AddedWords { added }))
}

/// `DELETE /scopes/{t}/{s}/{u}/filters/{word}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<WordPath>,
  Query(names): Query<Names>,
) -> Result<Json<Removed>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let (scope, word) = path.split();
  let removed = state
    .store
    .remove_filter(action_context(scope, names), word)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Removed { removed }))
}

/// `DELETE /scopes/{t}/{s}/{u}/filters`
pub async fn clear<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
  Query(names): Query<Names>,
) -> Result<Json<Cleared>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let removed = state
    .store
    .clear_filters(action_context(path, names))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Cleared { removed }))
}
