//! JSON-backed key/value store, one file per source

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::fs;
use tracing::debug;

/// Preferences of one source
#[derive(Debug, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: RwLock<Map<String, Value>>,
}

impl PreferenceStore {
    /// Store that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// `<dir>/<source_id>.json`
    pub fn path_for(dir: &Path, source_id: u64) -> PathBuf {
        dir.join(format!("{source_id}.json"))
    }

    /// Load from `path`; a missing file gives an empty store
    pub async fn load(path: PathBuf) -> Result<Self> {
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read preferences {}", path.display()))?;
            serde_json::from_str::<Map<String, Value>>(&raw)
                .context("Failed to parse preferences")?
        } else {
            debug!("No preferences at {:?}", path);
            Map::new()
        };
        Ok(Self {
            path: Some(path),
            values: RwLock::new(values),
        })
    }

    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create preferences directory")?;
        }
        let json = {
            let values = self.values.read().unwrap_or_else(|e| e.into_inner());
            serde_json::to_string_pretty(&*values).context("Failed to serialize preferences")?
        };
        fs::write(path, json).await.context("Failed to write preferences")?;
        Ok(())
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.into());
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
