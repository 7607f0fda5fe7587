//! Handlers for `/trainers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/trainers` | Body: `{"user_id":1,"user_name":"a#1"}`; 201 + welcome on first call |
//! | `GET`  | `/trainers/subscribed` | External ids of subscribed trainers |
//! | `GET`  | `/trainers/{user_id}` | 404 if not registered |
//! | `PUT`  | `/trainers/{user_id}/subscription` | Body: `{"subscribed":false}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use deepfake_core::{scope::ExternalId, store::TrainerStore, trainer::Trainer};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::BotClient, error::ApiError};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub user_id:   ExternalId,
  pub user_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
  pub trainer: Trainer,
  /// Only present the first time; the chat client sends it to the user.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub welcome: Option<&'static str>,
}

/// `POST /trainers`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let registration = state
    .store
    .register_trainer(body.user_id, body.user_name)
    .await
    .map_err(ApiError::from_store)?;

  let status = if registration.is_created() {
    StatusCode::CREATED
  } else {
    StatusCode::OK
  };
  let welcome = registration.welcome();
  let trainer = registration.into_inner();
  Ok((status, Json(RegisterResponse { trainer, welcome })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /trainers/{user_id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(user_id): Path<ExternalId>,
) -> Result<Json<Trainer>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let trainer = state
    .store
    .get_trainer(user_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("trainer {user_id} not registered")))?;
  Ok(Json(trainer))
}

// ─── Subscription ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscriptionBody {
  pub subscribed: bool,
}

/// `PUT /trainers/{user_id}/subscription`
pub async fn set_subscription<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
  Path(user_id): Path<ExternalId>,
  Json(body): Json<SubscriptionBody>,
) -> Result<Json<Trainer>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let trainer = state
    .store
    .set_subscription(user_id, body.subscribed)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(trainer))
}

/// `GET /trainers/subscribed`
pub async fn subscribed<S>(
  State(state): State<AppState<S>>,
  _: BotClient,
) -> Result<Json<Vec<ExternalId>>, ApiError>
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  let ids = state
    .store
    .subscribed_trainers()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(ids))
}
