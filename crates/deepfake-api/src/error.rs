//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use deepfake_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error: domain failures keep their meaning, anything
  /// else is an opaque storage failure.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    let classified = e.as_core().and_then(Self::from_core);
    classified.unwrap_or_else(|| Self::Store(Box::new(e)))
  }

  fn from_core(e: &deepfake_core::Error) -> Option<Self> {
    use deepfake_core::Error as Core;
    match e {
      e if e.is_not_found() => Some(Self::NotFound(e.to_string())),
      Core::DuplicateArtifact(_) => Some(Self::Conflict(e.to_string())),
      Core::InvalidFilter(msg) => Some(Self::BadRequest(msg.clone())),
      _ => None,
    }
  }
}

impl From<deepfake_core::Error> for ApiError {
  fn from(e: deepfake_core::Error) -> Self {
    Self::from_core(&e).unwrap_or_else(|| Self::BadRequest(e.to_string()))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })))
            .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"deepfake\""),
        );
        return res;
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
