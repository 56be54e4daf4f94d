use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::context::LoadGate;
use crate::error::HistoryError;
use crate::error::Result;
use crate::factory::Backend;
use crate::rank::RankLimits;
use crate::sanitize::DEFAULT_LABEL_BUDGET;

pub const ENV_BACKEND: &str = "FHC_HISTORY_BACKEND";
pub const ENV_JSONL: &str = "FHC_HISTORY_JSONL";
pub const ENV_DB: &str = "FHC_HISTORY_DB";

/// Tunables for ranking, page-load polling and storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_per_group: usize,
    pub label_budget: usize,
    pub poll_interval_ms: u64,
    pub max_load_attempts: u32,
    pub backend: Backend,
    /// Overrides `<store dir>/history.jsonl`.
    pub jsonl_path: Option<PathBuf>,
    /// Overrides `<store dir>/history.db`.
    pub db_path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_per_group: 10,
            label_budget: DEFAULT_LABEL_BUDGET,
            poll_interval_ms: 1000,
            max_load_attempts: 30,
            backend: Backend::Jsonl,
            jsonl_path: None,
            db_path: None,
        }
    }
}

impl HistoryConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| HistoryError::InvalidInput(format!("config: {e}")))
    }

    /// Defaults, then `path` if it exists, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(text) => Self::from_toml_str(&text)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
                Err(e) => return Err(e.into()),
            },
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `FHC_HISTORY_*` overrides read through `lookup`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_BACKEND) {
            match Backend::parse(&value) {
                Some(backend) => self.backend = backend,
                None => tracing::warn!("ignoring unknown {ENV_BACKEND} value '{value}'"),
            }
        }
        if let Some(path) = lookup(ENV_JSONL).filter(|p| !p.is_empty()) {
            self.jsonl_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(ENV_DB).filter(|p| !p.is_empty()) {
            self.db_path = Some(PathBuf::from(path));
        }
    }

    pub fn rank_limits(&self) -> RankLimits {
        RankLimits {
            max_per_group: self.max_per_group,
            label_budget: self.label_budget,
        }
    }

    pub fn load_gate(&self) -> LoadGate {
        LoadGate {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_load_attempts,
        }
    }
}
