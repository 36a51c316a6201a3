use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_MODEL;

pub const CONFIG_FILE: &str = "chatdpt.json";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
  pub host: String,
  pub port: u16,
  pub default_model: String,
  /// When false the relay speaks the older protocol where only `message` and
  /// `threadId` are required and `model` falls back to `default_model`.
  pub require_model: bool,
  pub generation_base_url: String,
  pub history_db: Option<PathBuf>,
  pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      host: "0.0.0.0".to_string(),
      port: 5000,
      default_model: DEFAULT_MODEL.to_string(),
      require_model: true,
      generation_base_url: "https://api.groq.com/openai/v1".to_string(),
      history_db: None,
      log_file: None,
    }
  }
}

impl AppConfig {
  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

/// Reads the relay config, writing the defaults first when no file exists.
pub fn load_or_init(path: &Path) -> anyhow::Result<AppConfig> {
  if !path.exists() {
    let config = AppConfig::default();
    save_config(path, &config)?;
    return Ok(config);
  }
  let data = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read config {}", path.display()))?;
  serde_json::from_str(&data).with_context(|| format!("invalid config {}", path.display()))
}

pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(config)?;
  std::fs::write(path, json).with_context(|| format!("failed to write config {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn load_or_init_writes_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE);

    let config = load_or_init(&path).expect("config should initialize");
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.port, 5000);
    assert!(path.exists());
  }

  #[test]
  fn partial_file_keeps_defaults_for_missing_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(&path, r#"{ "require_model": false }"#).expect("write config");

    let config = load_or_init(&path).expect("config should load");
    assert!(!config.require_model);
    assert_eq!(config.bind_addr(), "0.0.0.0:5000");
  }

  #[test]
  fn invalid_file_error_names_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE);
    std::fs::write(&path, "{ port: ").expect("write config");

    let err = load_or_init(&path).expect_err("broken config should fail");
    assert!(format!("{err:#}").contains(CONFIG_FILE));
  }
}
