use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;

#[derive(Clone, Debug, PartialEq)]
pub struct StoredMessage {
  pub role: String,
  pub content: String,
}

impl StoredMessage {
  pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
    Self { role: role.into(), content: content.into() }
  }
}

/// Durable message history. Write-only from the relay's point of view.
#[async_trait]
pub trait MessageStore: Send + Sync {
  async fn store(&self, message: &StoredMessage) -> anyhow::Result<()>;
}

pub struct SqliteMessageStore {
  db: Mutex<Connection>,
}

impl SqliteMessageStore {
  pub fn open(path: &Path) -> anyhow::Result<Self> {
    Self::with_connection(Connection::open(path)?)
  }

  pub fn in_memory() -> anyhow::Result<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> anyhow::Result<Self> {
    conn.execute_batch(
      "
      CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
      );
      ",
    )?;
    Ok(Self { db: Mutex::new(conn) })
  }

  pub async fn count(&self) -> anyhow::Result<i64> {
    let conn = self.db.lock().await;
    let n = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
    Ok(n)
  }

  /// Newest first.
  pub async fn recent(&self, limit: i64) -> anyhow::Result<Vec<StoredMessage>> {
    let conn = self.db.lock().await;
    let mut stmt = conn.prepare(
      "SELECT role, content FROM messages ORDER BY created_at DESC, rowid DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
      Ok(StoredMessage {
        role: row.get(0)?,
        content: row.get(1)?,
      })
    })?;

    let mut items = Vec::new();
    for row in rows {
      items.push(row?);
    }
    Ok(items)
  }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
  async fn store(&self, message: &StoredMessage) -> anyhow::Result<()> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    let conn = self.db.lock().await;
    conn.execute(
      "INSERT INTO messages (id, role, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
      params![id, message.role, message.content, now],
    )?;
    Ok(())
  }
}
