//! HTTP Basic authentication for the chat bot client.
//!
//! The configured password hash is parsed once when the server starts, so a
//! malformed `auth_password_hash` fails at startup instead of turning every
//! request into a 401. Requests that pass carry a [`BotClient`] into the
//! handler, and the client name is recorded on the request's trace span.

use argon2::{
  Argon2, PasswordVerifier,
  password_hash::{self, PasswordHashString},
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderValue, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use deepfake_core::store::TrainerStore;

use crate::{AppState, error::ApiError};

/// The one username/password pair this server accepts.
#[derive(Clone)]
pub struct BotCredentials {
  username: String,
  hash:     PasswordHashString,
}

impl BotCredentials {
  /// `password_hash` is an argon2 PHC string, e.g. `$argon2id$v=19$…`.
  pub fn new(
    username: impl Into<String>,
    password_hash: &str,
  ) -> Result<Self, password_hash::Error> {
    Ok(Self {
      username: username.into(),
      hash:     PasswordHashString::new(password_hash)?,
    })
  }

  /// The client named by an `Authorization` header, if its credentials match.
  pub fn authenticate(&self, authorization: Option<&HeaderValue>) -> Option<BotClient> {
    let (username, password) = basic_credentials(authorization?)?;
    if username != self.username {
      return None;
    }
    Argon2::default()
      .verify_password(password.as_bytes(), &self.hash.password_hash())
      .ok()?;
    Some(BotClient { username })
  }
}

/// Split a `Basic` header into username and password.
fn basic_credentials(value: &HeaderValue) -> Option<(String, String)> {
  let encoded = value.to_str().ok()?.strip_prefix("Basic ")?;
  let decoded = String::from_utf8(B64.decode(encoded.trim()).ok()?).ok()?;
  let (user, pass) = decoded.split_once(':')?;
  Some((user.to_owned(), pass.to_owned()))
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotClient {
  pub username: String,
}

impl<S> FromRequestParts<AppState<S>> for BotClient
where
  S: TrainerStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(client) = state
      .auth
      .authenticate(parts.headers.get(header::AUTHORIZATION))
    else {
      tracing::debug!(uri = %parts.uri, "rejected credentials");
      return Err(ApiError::Unauthorized);
    };
    tracing::Span::current().record("client", client.username.as_str());
    Ok(client)
  }
}
