use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::models::GenerationRequest;

const KEYRING_SERVICE: &str = "ChatDPT";
const KEYRING_USER: &str = "groq";
const API_KEY_ENV: &str = "GROQ_API_KEY";

/// The external text-generation capability the relay forwards to.
#[async_trait]
pub trait Generator: Send + Sync {
  async fn generate(&self, req: &GenerationRequest) -> anyhow::Result<String>;
}

pub struct GroqGenerator {
  client: reqwest::Client,
  base_url: String,
}

#[derive(serde::Serialize, Debug)]
struct CompletionMessage {
  role: String,
  content: String,
}

#[derive(serde::Serialize, Debug)]
struct CompletionRequest {
  model: String,
  messages: Vec<CompletionMessage>,
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<serde_json::Value>,
  stream: bool,
}

impl GroqGenerator {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
    }
  }

  fn endpoint(&self) -> String {
    format!("{}/chat/completions", self.base_url)
  }
}

#[async_trait]
impl Generator for GroqGenerator {
  async fn generate(&self, req: &GenerationRequest) -> anyhow::Result<String> {
    let key = api_key()?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);

    let resp = self
      .client
      .post(self.endpoint())
      .headers(headers)
      .json(&completion_payload(req))
      .send()
      .await?;

    if !resp.status().is_success() {
      let status = resp.status();
      let text = resp
        .text()
        .await
        .unwrap_or_else(|_| "generation request failed".to_string());
      anyhow::bail!("generation error ({}): {}", status, text);
    }

    let body = resp.json::<serde_json::Value>().await?;
    extract_reply(&body)
  }
}

fn completion_payload(req: &GenerationRequest) -> CompletionRequest {
  CompletionRequest {
    model: req.model.clone(),
    messages: vec![CompletionMessage {
      role: "user".to_string(),
      content: req.message.clone(),
    }],
    temperature: req.temperature.clone(),
    max_tokens: req.max_tokens.clone(),
    stream: false,
  }
}

fn extract_reply(body: &serde_json::Value) -> anyhow::Result<String> {
  body["choices"][0]["message"]["content"]
    .as_str()
    .map(str::to_string)
    .ok_or_else(|| anyhow::anyhow!("generation response had no message content"))
}

fn api_key() -> anyhow::Result<String> {
  let from_keyring = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
    .and_then(|e| e.get_password())
    .ok()
    .filter(|k| !k.trim().is_empty());
  if let Some(key) = from_keyring {
    return Ok(key);
  }

  match std::env::var(API_KEY_ENV) {
    Ok(key) if !key.trim().is_empty() => Ok(key),
    _ => Err(anyhow::anyhow!(
      "generation API key missing: store it in the keyring ({KEYRING_SERVICE}/{KEYRING_USER}) or set {API_KEY_ENV}"
    )),
  }
}
