use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;

pub const THEME_KEY: &str = "theme";
pub const TEMPLATES_KEY: &str = "promptTemplates";

/// Client-side persistent string store, the desktop stand-in for a browser's
/// local storage.
pub trait KeyValueStore {
  fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
  fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
  fn delete(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> anyhow::Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
    self
      .entries
      .lock()
      .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
    Ok(self.entries()?.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
    self.entries()?.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn delete(&self, key: &str) -> anyhow::Result<()> {
    self.entries()?.remove(key);
    Ok(())
  }
}

/// A JSON object on disk, rewritten whole on every mutation.
pub struct FileStore {
  path: PathBuf,
  entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
  pub fn open(path: &Path) -> anyhow::Result<Self> {
    let entries = if path.exists() {
      let data = std::fs::read_to_string(path)?;
      serde_json::from_str(&data)?
    } else {
      BTreeMap::new()
    };
    Ok(Self {
      path: path.to_path_buf(),
      entries: Mutex::new(entries),
    })
  }

  fn update<F>(&self, f: F) -> anyhow::Result<()>
  where
    F: FnOnce(&mut BTreeMap<String, String>),
  {
    let mut entries = self
      .entries
      .lock()
      .map_err(|_| anyhow::anyhow!("file store lock poisoned"))?;
    // Memory only changes once the file holds the new state.
    let mut next = entries.clone();
    f(&mut next);
    let json = serde_json::to_string_pretty(&next)?;
    std::fs::write(&self.path, json)
      .with_context(|| format!("failed to write {}", self.path.display()))?;
    *entries = next;
    Ok(())
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
    let entries = self
      .entries
      .lock()
      .map_err(|_| anyhow::anyhow!("file store lock poisoned"))?;
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
    self.update(|entries| {
      entries.insert(key.to_string(), value.to_string());
    })
  }

  fn delete(&self, key: &str) -> anyhow::Result<()> {
    self.update(|entries| {
      entries.remove(key);
    })
  }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
  fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
    (**self).get(key)
  }

  fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
    (**self).set(key, value)
  }

  fn delete(&self, key: &str) -> anyhow::Result<()> {
    (**self).delete(key)
  }
}
