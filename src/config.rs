use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::parse_endpoint;
use crate::error::{Error, Result};

/// Route and port the backend serves queries on out of the box.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/query";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Read a config file, treating a missing file as the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate and store a new default endpoint; call `save` to persist it.
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        let url = parse_endpoint(endpoint)?;
        self.endpoint = Some(url.to_string());
        Ok(())
    }

    /// Pick the endpoint: explicit override (`--endpoint` or
    /// `JAVABOT_ENDPOINT`, merged by the CLI), then the
    /// config file, then [`DEFAULT_ENDPOINT`].
    pub fn resolve_endpoint(&self, override_endpoint: Option<&str>) -> String {
        override_endpoint
            .filter(|e| !e.trim().is_empty())
            .map(|e| e.trim().to_string())
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Request timeout; zero means none.
    pub fn resolve_timeout(&self, override_secs: Option<u64>) -> Option<Duration> {
        override_secs
            .or(self.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;

        Ok(config_dir.join("javabot").join("config.json"))
    }
}
