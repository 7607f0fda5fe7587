//! Handlers for `/deployments`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/deployments` | Body: [`CreateBody`]; 201 + the stored deployment |
//! | `GET`  | `/deployments/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use deepfake_core::{deployment::Deployment, scope::ExternalId, store::TrainerStore};
use rand_core::{OsRng, RngCore as _};
use serde::Deserialize;

use crate::{AppState, auth::BotClient, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub trainer_id: ExternalId,
  pub model_uid:  String,
  /// Generated when omitted.
  #[serde(default)]
  pub secret_key: Option<String>,
  /// A non-blank token makes this a hosted deployment.
  #[serde(default)]
  pub bot_token:  Option<String>,
}

/// 32 random bytes, hex encoded.
pub fn generate_secret_key() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// `POST /deployments`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<Deployment>), ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let secret_key = match body.secret_key {
    Some(key) if !key.is_empty() => key,
    _ => generate_secret_key(),
  };
  let deployment = state
    .store
    .create_deployment(body.trainer_id, body.model_uid, secret_key, body.bot_token)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(deployment)))
}

/// `GET /deployments/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(id): Path<i64>,
) -> Result<Json<Deployment>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let deployment = state
    .store
    .get_deployment(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("deployment {id} not found")))?;
  Ok(Json(deployment))
}
