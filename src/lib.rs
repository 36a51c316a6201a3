pub mod config;
pub mod errors;
pub mod generator;
pub mod kv_store;
pub mod logger;
pub mod models;
pub mod router;
pub mod session;
pub mod storage;

pub use errors::{RelayError, SessionError};
pub use generator::{Generator, GroqGenerator};
pub use kv_store::{FileStore, KeyValueStore, MemoryStore};
pub use router::{build_router, run_router, RouterState};
pub use session::{ChatSession, HttpRelayClient, RelayClient, SendOutcome};
pub use storage::{MessageStore, SqliteMessageStore, StoredMessage};
