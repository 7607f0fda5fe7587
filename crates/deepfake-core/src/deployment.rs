//! Deployments of a trained model as a bot instance.
//!
//! A deployment is either run by the trainer themself or hosted for them.
//! Hosting configuration only exists on the hosted variant, so a "hosted
//! without config" state cannot be constructed.

use serde::{Deserialize, Serialize};

/// Operational settings for a hosted bot instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedConfig {
  pub ip_address:                String,
  pub active:                    bool,
  pub reply_probability:         f64,
  /// Seconds.
  pub new_conversation_min_wait: u32,
  /// Seconds.
  pub new_conversation_max_wait: u32,
  pub max_sentence_length:       u32,
  pub quiet_mode:                bool,
  pub bot_token:                 String,
}

impl HostedConfig {
  /// Placeholder address until the host assigns a real one.
  pub const UNASSIGNED_IP: &'static str = "0.0.0.0";

  /// A fresh hosting record with the standard defaults.
  pub fn with_token(bot_token: impl Into<String>) -> Self {
    Self {
      ip_address:                Self::UNASSIGNED_IP.to_owned(),
      active:                    true,
      reply_probability:         0.3,
      new_conversation_min_wait: 60,
      new_conversation_max_wait: 3600,
      max_sentence_length:       250,
      quiet_mode:                false,
      bot_token:                 bot_token.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config", rename_all = "snake_case")]
pub enum DeploymentKind {
  SelfHosted,
  Hosted(HostedConfig),
}

impl DeploymentKind {
  /// Absent, empty or blank tokens all mean the trainer runs the bot. A
  /// usable token is kept exactly as supplied.
  pub fn from_token(bot_token: Option<&str>) -> Self {
    match bot_token {
      Some(token) if !token.trim().is_empty() => {
        Self::Hosted(HostedConfig::with_token(token))
      }
      _ => Self::SelfHosted,
    }
  }

  pub fn is_hosted(&self) -> bool { matches!(self, Self::Hosted(_)) }

  pub fn hosted_config(&self) -> Option<&HostedConfig> {
    match self {
      Self::Hosted(cfg) => Some(cfg),
      Self::SelfHosted => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
  pub id:         i64,
  pub secret_key: String,
  pub markov_id:  i64,
  pub trainer_id: i64,
  pub kind:       DeploymentKind,
}
