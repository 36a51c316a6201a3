use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

pub const MIN_MAX_TOKENS: u32 = 100;
pub const MAX_MAX_TOKENS: u32 = 2000;

pub const KNOWN_MODELS: &[&str] = &[
  "llama-3.3-70b-versatile",
  "llama-3.1-8b-instant",
  "gemma2-9b-it",
  "mixtral-8x7b-32768",
];

/// Body of `POST /api/chat`. Every field is optional on the wire so the relay
/// can answer a missing one with its own 400 instead of a decode rejection.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thread_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
  /// Sampling values are relayed as received, whatever their JSON shape.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub temperature: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ChatResponse {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
  pub error: String,
}

/// A request that passed relay validation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
  pub message: String,
  pub thread_id: String,
  pub model: String,
  pub temperature: Option<serde_json::Value>,
  pub max_tokens: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
  User,
  Server,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
  pub from: Origin,
  pub text: String,
}

impl Message {
  pub fn user(text: impl Into<String>) -> Self {
    Self { from: Origin::User, text: text.into() }
  }

  pub fn server(text: impl Into<String>) -> Self {
    Self { from: Origin::Server, text: text.into() }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SavedTemplate {
  pub id: i64,
  pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

impl Theme {
  pub fn as_str(self) -> &'static str {
    match self {
      Theme::Light => "light",
      Theme::Dark => "dark",
    }
  }

  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "light" => Some(Theme::Light),
      "dark" => Some(Theme::Dark),
      _ => None,
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      Theme::Light => Theme::Dark,
      Theme::Dark => Theme::Light,
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
  pub model: String,
  pub temperature: f64,
  pub max_tokens: u32,
}

impl Default for GenerationParams {
  fn default() -> Self {
    Self {
      model: DEFAULT_MODEL.to_string(),
      temperature: DEFAULT_TEMPERATURE,
      max_tokens: DEFAULT_MAX_TOKENS,
    }
  }
}

pub fn clamp_temperature(value: f64) -> f64 {
  if value.is_nan() {
    return DEFAULT_TEMPERATURE;
  }
  value.clamp(0.0, 1.0)
}

pub fn clamp_max_tokens(value: u32) -> u32 {
  value.clamp(MIN_MAX_TOKENS, MAX_MAX_TOKENS)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn chat_request_uses_camel_case_keys() {
    let req: ChatRequest = serde_json::from_str(
      r#"{"message":"hi","threadId":"t1","model":"m","temperature":0.2,"maxTokens":300}"#,
    )
    .expect("request should decode");
    assert_eq!(req.thread_id.as_deref(), Some("t1"));
    assert_eq!(req.max_tokens, Some(serde_json::json!(300)));

    let json = serde_json::to_value(&req).expect("request should encode");
    assert!(json.get("threadId").is_some());
    assert!(json.get("thread_id").is_none());
  }

  #[test]
  fn chat_request_tolerates_missing_fields() {
    let req: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).expect("partial request");
    assert_eq!(req.message.as_deref(), Some("hi"));
    assert!(req.thread_id.is_none());
    assert!(req.model.is_none());
  }

  #[test]
  fn message_origin_is_lowercase() {
    let json = serde_json::to_value(Message::server("ok")).expect("message should encode");
    assert_eq!(json, serde_json::json!({ "from": "server", "text": "ok" }));
  }

  #[test]
  fn theme_toggles_and_parses() {
    assert_eq!(Theme::Light.toggled(), Theme::Dark);
    assert_eq!(Theme::parse(Theme::Dark.as_str()), Some(Theme::Dark));
    assert_eq!(Theme::parse("sepia"), None);
  }

  #[test]
  fn clamps_generation_parameters() {
    assert_eq!(clamp_temperature(1.5), 1.0);
    assert_eq!(clamp_temperature(-0.1), 0.0);
    assert_eq!(clamp_temperature(f64::NAN), DEFAULT_TEMPERATURE);
    assert_eq!(clamp_max_tokens(5), MIN_MAX_TOKENS);
    assert_eq!(clamp_max_tokens(5000), MAX_MAX_TOKENS);
    assert_eq!(clamp_max_tokens(750), 750);
  }
}
