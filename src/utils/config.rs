//! Application configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// HTTP client behaviour
    pub network: NetworkSettings,

    /// Width of parallel maps (server resolution, detail fan-out)
    pub concurrency: usize,

    /// Sites registered at startup
    pub sites: Vec<SiteConfig>,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub initial_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    /// Fixed user agent; rotates through a browser pool when unset
    pub user_agent: Option<String>,
}

/// Which engine drives a configured site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    AnimeStream,
    Livewire,
    AnilistMirror,
}

/// One configured site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub kind: SiteKind,
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Passphrase for AES-encrypted embed links (AnimeStream)
    #[serde(default)]
    pub embed_passphrase: Option<String>,
    /// HMAC secret for signed manifests (AniList mirror)
    #[serde(default)]
    pub signing_secret: Option<String>,
    /// Livewire component name of the listing
    #[serde(default)]
    pub component: Option<String>,
}

fn default_lang() -> String {
    "en".to_string()
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            initial_retry_delay_ms: 500,
            max_retry_delay_ms: 8000,
            user_agent: None,
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            network: NetworkSettings::default(),
            concurrency: 4,
            sites: vec![
                SiteConfig {
                    kind: SiteKind::AnimeStream,
                    name: "AnimeStream".to_string(),
                    base_url: "https://animestream.example".to_string(),
                    lang: default_lang(),
                    embed_passphrase: None,
                    signing_secret: None,
                    component: None,
                },
                SiteConfig {
                    kind: SiteKind::Livewire,
                    name: "WireAnime".to_string(),
                    base_url: "https://wireanime.example".to_string(),
                    lang: default_lang(),
                    embed_passphrase: None,
                    signing_secret: None,
                    component: Some("anime-list".to_string()),
                },
                SiteConfig {
                    kind: SiteKind::AnilistMirror,
                    name: "AniMirror".to_string(),
                    base_url: "https://animirror.example".to_string(),
                    lang: default_lang(),
                    embed_passphrase: None,
                    signing_secret: None,
                    component: None,
                },
            ],
        }
    }
}

impl AppSettings {
    /// Default location: `<config_dir>/anisource/config.json`
    pub fn default_path() -> PathBuf {
        config_root().join("config.json")
    }

    /// Load settings from the default location
    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()).await
    }

    /// Load settings from a file, falling back to defaults when it does not exist
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let settings: AppSettings =
            serde_json::from_str(&raw).context("Failed to parse config")?;
        info!("Loaded {} site(s) from {:?}", settings.sites.len(), path);
        Ok(settings.sanitized())
    }

    /// Persist settings as pretty JSON
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json).await.context("Failed to write config")?;
        Ok(())
    }

    /// Enforce sane minimums
    pub fn sanitized(mut self) -> Self {
        if self.concurrency == 0 {
            self.concurrency = 1;
        }
        if self.network.timeout_secs == 0 {
            self.network.timeout_secs = 1;
        }
        if self.network.max_retry_delay_ms < self.network.initial_retry_delay_ms {
            self.network.max_retry_delay_ms = self.network.initial_retry_delay_ms;
        }
        self
    }
}

/// Root directory for anisource state (config, preferences)
pub fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("anisource")
}

/// Per-source preference files live here
pub fn prefs_dir() -> PathBuf {
    config_root().join("prefs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppSettings::default();
        assert!(config.concurrency > 0);
        assert!(config.network.max_retries > 0);
        assert_eq!(config.sites.len(), 3);
    }

    #[test]
    fn test_sanitized_enforces_minimums() {
        let mut config = AppSettings::default();
        config.concurrency = 0;
        config.network.timeout_secs = 0;
        config.network.max_retry_delay_ms = 10;

        let config = config.sanitized();
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.network.timeout_secs, 1);
        assert_eq!(
            config.network.max_retry_delay_ms,
            config.network.initial_retry_delay_ms
        );
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppSettings::load_from(&dir.path().join("nope.json"))
            .await
            .unwrap();
        assert_eq!(config.concurrency, AppSettings::default().concurrency);
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let mut config = AppSettings::default();
        config.concurrency = 9;
        config.sites.truncate(1);
        config.save_to(&path).await.unwrap();

        let loaded = AppSettings::load_from(&path).await.unwrap();
        assert_eq!(loaded.concurrency, 9);
        assert_eq!(loaded.sites.len(), 1);
        assert_eq!(loaded.sites[0].kind, SiteKind::AnimeStream);
    }

    #[test]
    fn test_partial_json_uses_field_defaults() {
        let json = r#"{"sites":[{"kind":"livewire","name":"X","base_url":"https://x.example"}]}"#;
        let config: AppSettings = serde_json::from_str(json).unwrap();
        assert_eq!(config.sites[0].lang, "en");
        assert_eq!(config.network.max_retries, 3);
        assert_eq!(config.concurrency, 4);
    }
}
