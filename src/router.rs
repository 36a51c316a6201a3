use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};

use crate::config::AppConfig;
use crate::errors::RelayError;
use crate::generator::Generator;
use crate::models::{ChatRequest, ChatResponse, GenerationRequest};
use crate::storage::{MessageStore, StoredMessage};

pub const WELCOME: &str = "Welcome to ChatDPT!";

const REQUIRED_FIELDS: &str = "Message, threadId and model are required!";
const LEGACY_REQUIRED_FIELDS: &str = "Message and threadId are required!";

pub struct RouterState {
  pub started_at: Instant,
  pub config: AppConfig,
  pub generator: Arc<dyn Generator>,
  pub history: Option<Arc<dyn MessageStore>>,
}

impl RouterState {
  pub fn new(config: AppConfig, generator: Arc<dyn Generator>) -> Self {
    Self {
      started_at: Instant::now(),
      config,
      generator,
      history: None,
    }
  }

  pub fn with_history(mut self, history: Arc<dyn MessageStore>) -> Self {
    self.history = Some(history);
    self
  }
}

pub fn build_router(state: RouterState) -> Router {
  Router::new()
    .route("/", get(welcome))
    .route("/health", get(health))
    .route("/api/chat", post(chat))
    .layer(CatchPanicLayer::custom(panic_response))
    .layer(
      CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any),
    )
    .with_state(Arc::new(state))
}

/// A panicking handler answers like any other internal failure.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
  let detail = if let Some(s) = payload.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic payload".to_string()
  };
  RelayError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

pub async fn run_router(listener: tokio::net::TcpListener, state: RouterState) -> anyhow::Result<()> {
  axum::serve(listener, build_router(state)).await?;
  Ok(())
}

async fn welcome() -> &'static str {
  WELCOME
}

async fn health(State(state): State<Arc<RouterState>>) -> Json<serde_json::Value> {
  let uptime = state.started_at.elapsed().as_millis();
  Json(serde_json::json!({
    "status": "ok",
    "version": env!("CARGO_PKG_VERSION"),
    "uptime_ms": uptime
  }))
}

async fn chat(
  State(state): State<Arc<RouterState>>,
  body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, RelayError> {
  let req = match body {
    Ok(Json(req)) => req,
    Err(rejection) => {
      tracing::warn!(error = %rejection, "unreadable chat request body");
      return Err(missing_field(&state.config));
    }
  };

  let gen_req = validate(req, &state.config)?;
  tracing::info!(
    message = %gen_req.message,
    thread_id = %gen_req.thread_id,
    model = %gen_req.model,
    "chat request"
  );

  let reply = state.generator.generate(&gen_req).await?;
  record_history(&state, &gen_req.message, &reply).await;

  Ok(Json(ChatResponse { message: Some(reply) }))
}

fn missing_field(config: &AppConfig) -> RelayError {
  if config.require_model {
    RelayError::MissingField(REQUIRED_FIELDS)
  } else {
    RelayError::MissingField(LEGACY_REQUIRED_FIELDS)
  }
}

fn present(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}

fn validate(req: ChatRequest, config: &AppConfig) -> Result<GenerationRequest, RelayError> {
  let message = present(req.message);
  let thread_id = present(req.thread_id);
  let model = match present(req.model) {
    Some(m) => Some(m),
    None if !config.require_model => Some(config.default_model.clone()),
    None => None,
  };

  match (message, thread_id, model) {
    (Some(message), Some(thread_id), Some(model)) => Ok(GenerationRequest {
      message,
      thread_id,
      model,
      temperature: req.temperature,
      max_tokens: req.max_tokens,
    }),
    _ => Err(missing_field(config)),
  }
}

async fn record_history(state: &RouterState, message: &str, reply: &str) {
  let Some(history) = state.history.as_ref() else {
    return;
  };
  for entry in [StoredMessage::new("user", message), StoredMessage::new("assistant", reply)] {
    if let Err(err) = history.store(&entry).await {
      tracing::warn!(error = %format!("{err:#}"), role = %entry.role, "failed to store message");
    }
  }
}
