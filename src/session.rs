use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::SessionError;
use crate::kv_store::{KeyValueStore, TEMPLATES_KEY, THEME_KEY};
use crate::models::{
  clamp_max_tokens, clamp_temperature, ChatRequest, ChatResponse, GenerationParams, Message,
  SavedTemplate, Theme, KNOWN_MODELS,
};

pub const NO_REPLY: &str = "⚠️ No reply from server";
pub const SERVER_ERROR: &str = "⚠️ Server error, please try again";

/// Transport to the relay. A call succeeds whenever a decodable body comes
/// back, whatever the HTTP status.
#[async_trait]
pub trait RelayClient: Send + Sync {
  async fn chat(&self, req: &ChatRequest) -> anyhow::Result<ChatResponse>;
}

pub struct HttpRelayClient {
  client: reqwest::Client,
  url: String,
}

impl HttpRelayClient {
  pub fn new(base_url: &str) -> Self {
    Self {
      client: reqwest::Client::new(),
      url: format!("{}/api/chat", base_url.trim_end_matches('/')),
    }
  }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
  async fn chat(&self, req: &ChatRequest) -> anyhow::Result<ChatResponse> {
    let resp = self.client.post(&self.url).json(req).send().await?;
    Ok(resp.json::<ChatResponse>().await?)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
  /// Blank input, nothing appended or sent.
  Ignored,
  Replied,
  Failed,
}

pub struct ChatSession<C, S> {
  client: C,
  store: S,
  thread_id: String,
  messages: Vec<Message>,
  input: String,
  loading: bool,
  theme: Theme,
  params: GenerationParams,
  templates: Vec<SavedTemplate>,
}

impl<C: RelayClient, S: KeyValueStore> ChatSession<C, S> {
  pub fn new(client: C, store: S) -> Result<Self, SessionError> {
    Self::with_thread_id(client, store, uuid::Uuid::new_v4().to_string())
  }

  pub fn with_thread_id(client: C, store: S, thread_id: impl Into<String>) -> Result<Self, SessionError> {
    let theme = load_theme(&store)?;
    let templates = load_templates(&store)?;
    Ok(Self {
      client,
      store,
      thread_id: thread_id.into(),
      messages: Vec::new(),
      input: String::new(),
      loading: false,
      theme,
      params: GenerationParams::default(),
      templates,
    })
  }

  pub fn thread_id(&self) -> &str {
    &self.thread_id
  }

  pub fn messages(&self) -> &[Message] {
    &self.messages
  }

  pub fn input(&self) -> &str {
    &self.input
  }

  pub fn set_input(&mut self, text: impl Into<String>) {
    self.input = text.into();
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn theme(&self) -> Theme {
    self.theme
  }

  pub fn params(&self) -> &GenerationParams {
    &self.params
  }

  pub fn templates(&self) -> &[SavedTemplate] {
    &self.templates
  }

  pub fn set_model(&mut self, model: &str) -> Result<(), SessionError> {
    if !KNOWN_MODELS.contains(&model) {
      return Err(SessionError::UnknownModel(model.to_string()));
    }
    self.params.model = model.to_string();
    Ok(())
  }

  pub fn set_temperature(&mut self, temperature: f64) {
    self.params.temperature = clamp_temperature(temperature);
  }

  pub fn set_max_tokens(&mut self, max_tokens: u32) {
    self.params.max_tokens = clamp_max_tokens(max_tokens);
  }

  /// Sends whatever is in the input box.
  pub async fn submit(&mut self) -> SendOutcome {
    let text = self.input.clone();
    self.send_message(&text).await
  }

  /// One relay call per non-blank send. The user message stays in the
  /// history even when the call fails. `&mut self` keeps sends serialized.
  pub async fn send_message(&mut self, text: &str) -> SendOutcome {
    if text.trim().is_empty() {
      return SendOutcome::Ignored;
    }

    self.messages.push(Message::user(text));
    self.input.clear();
    self.loading = true;

    let req = ChatRequest {
      message: Some(text.to_string()),
      thread_id: Some(self.thread_id.clone()),
      model: Some(self.params.model.clone()),
      temperature: Some(self.params.temperature.into()),
      max_tokens: Some(self.params.max_tokens.into()),
    };

    let outcome = match self.client.chat(&req).await {
      Ok(resp) => {
        let text = resp
          .message
          .filter(|m| !m.is_empty())
          .unwrap_or_else(|| NO_REPLY.to_string());
        self.messages.push(Message::server(text));
        SendOutcome::Replied
      }
      Err(err) => {
        tracing::warn!(error = %format!("{err:#}"), thread_id = %self.thread_id, "chat request failed");
        self.messages.push(Message::server(SERVER_ERROR));
        SendOutcome::Failed
      }
    };

    self.loading = false;
    outcome
  }

  pub fn toggle_theme(&mut self) -> Result<Theme, SessionError> {
    let next = self.theme.toggled();
    self.store.set(THEME_KEY, next.as_str())?;
    self.theme = next;
    Ok(next)
  }

  /// Blank text is not saved.
  pub fn save_template(&mut self, text: &str) -> Result<Option<SavedTemplate>, SessionError> {
    if text.trim().is_empty() {
      return Ok(None);
    }
    let newest = self.templates.iter().map(|t| t.id).max().unwrap_or(i64::MIN);
    let id = Utc::now().timestamp_millis().max(newest.saturating_add(1));
    let template = SavedTemplate { id, text: text.to_string() };

    let mut next = self.templates.clone();
    next.push(template.clone());
    self.persist_templates(&next)?;
    self.templates = next;
    Ok(Some(template))
  }

  pub fn delete_template(&mut self, id: i64) -> Result<bool, SessionError> {
    if !self.templates.iter().any(|t| t.id == id) {
      return Ok(false);
    }
    let next: Vec<SavedTemplate> = self.templates.iter().filter(|t| t.id != id).cloned().collect();
    self.persist_templates(&next)?;
    self.templates = next;
    Ok(true)
  }

  /// Copies a template's text into the input box.
  pub fn load_template(&mut self, id: i64) -> bool {
    match self.templates.iter().find(|t| t.id == id) {
      Some(template) => {
        self.input = template.text.clone();
        true
      }
      None => false,
    }
  }

  /// Writes one message's text to `path`, the "download" action.
  pub fn export_message(&self, index: usize, path: &Path) -> anyhow::Result<()> {
    let message = self
      .messages
      .get(index)
      .ok_or_else(|| anyhow::anyhow!("no message at index {index}"))?;
    std::fs::write(path, &message.text)?;
    Ok(())
  }

  fn persist_templates(&self, templates: &[SavedTemplate]) -> Result<(), SessionError> {
    let json = serde_json::to_string(templates).map_err(anyhow::Error::from)?;
    self.store.set(TEMPLATES_KEY, &json)?;
    Ok(())
  }
}

fn load_theme<S: KeyValueStore>(store: &S) -> Result<Theme, SessionError> {
  match store.get(THEME_KEY)? {
    Some(value) => Ok(Theme::parse(&value).unwrap_or_else(|| {
      tracing::warn!(value = %value, "ignoring unknown stored theme");
      Theme::default()
    })),
    None => Ok(Theme::default()),
  }
}

fn load_templates<S: KeyValueStore>(store: &S) -> Result<Vec<SavedTemplate>, SessionError> {
  let Some(json) = store.get(TEMPLATES_KEY)? else {
    return Ok(Vec::new());
  };
  match serde_json::from_str(&json) {
    Ok(templates) => Ok(templates),
    Err(err) => {
      tracing::warn!(error = %err, "discarding unreadable saved templates");
      Ok(Vec::new())
    }
  }
}
