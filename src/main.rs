use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use chatdpt::config::{load_or_init, CONFIG_FILE};
use chatdpt::{logger, run_router, GroqGenerator, RouterState, SqliteMessageStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = load_or_init(Path::new(CONFIG_FILE)).context("failed to load config")?;
  logger::init(config.log_file.as_deref())?;

  let generator = Arc::new(GroqGenerator::new(config.generation_base_url.clone()));
  let mut state = RouterState::new(config.clone(), generator);

  if let Some(db_path) = config.history_db.as_deref() {
    let history = SqliteMessageStore::open(db_path)
      .with_context(|| format!("failed to open history db {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "message history enabled");
    state = state.with_history(Arc::new(history));
  }

  let listener = tokio::net::TcpListener::bind(config.bind_addr())
    .await
    .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
  tracing::info!("Server is running on port: {}", config.port);

  run_router(listener, state).await
}
