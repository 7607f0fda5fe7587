//! Handlers for the subject itself.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/scopes/{t}/{s}/{u}/subject` | Body: [`Names`]; 201 when newly registered |
//! | `GET`  | `/scopes/{t}/{s}/{u}/subject` | 404 if not registered |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use deepfake_core::{store::TrainerStore, trainer::Subject};

use super::{Names, ScopePath, action_context};
use crate::{AppState, auth::BotClient, error::ApiError};

/// `PUT /scopes/{t}/{s}/{u}/subject`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
  Json(names): Json<Names>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let registration = state
    .store
    .register_subject(action_context(path, names))
    .await
    .map_err(ApiError::from_store)?;

  let status = if registration.is_created() {
    StatusCode::CREATED
  } else {
    StatusCode::OK
  };
  Ok((status, Json(registration.into_inner())))
}

/// `GET /scopes/{t}/{s}/{u}/subject`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(path): Path<ScopePath>,
) -> Result<Json<Subject>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let scope = path.into();
  let subject = state
    .store
    .get_subject(scope)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("no subject for {scope}")))?;
  Ok(Json(subject))
}
