use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest file accepted by the upload endpoint.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024; // 100 MiB

pub const ENV_API_URL: &str = "LOVESTORY_API_URL";
pub const ENV_UPLOADS_URL: &str = "LOVESTORY_UPLOADS_URL";
pub const ENV_STORE: &str = "LOVESTORY_STORE";

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_uploads_url() -> String {
    "http://localhost:8080/uploads".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

/// Client settings, read from an optional TOML file and then the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_uploads_url")]
    pub uploads_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Where the token store lives; `None` means the per-user default
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            uploads_url: default_uploads_url(),
            timeout_secs: default_timeout_secs(),
            max_file_size: default_max_file_size(),
            store_path: None,
        }
    }
}

impl ClientConfig {
    /// Load from `path` when given, otherwise start from defaults; then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `LOVESTORY_*` overrides looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_UPLOADS_URL) {
            self.uploads_url = url;
        }
        if let Some(path) = lookup(ENV_STORE) {
            self.store_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Configured store path, or `$HOME/.lovestory/store.json`, or a file in the
    /// working directory when there is no home.
    pub fn resolved_store_path(&self) -> PathBuf {
        if let Some(path) = &self.store_path {
            return path.clone();
        }
        match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            Some(home) => PathBuf::from(home).join(".lovestory").join("store.json"),
            None => PathBuf::from(".lovestory-store.json"),
        }
    }
}
