//! Reference sources built from configured sites

pub mod anilist_mirror;
pub mod animestream;
pub mod livewire_catalog;

pub use anilist_mirror::AniListMirror;
pub use animestream::AnimeStream;
pub use livewire_catalog::LivewireCatalog;

use crate::anilist::AniListAnimeHttpSource;
use crate::extractors::ExtractorRegistry;
use crate::network::Transport;
use crate::preferences::PreferenceStore;
use crate::source::{source_id, AnimeSource, ScraperSource, SourceRegistry};
use crate::utils::config::{prefs_dir, AppSettings, SiteConfig, SiteKind};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

async fn preferences(site: &SiteConfig, dir: Option<&Path>) -> Result<Arc<PreferenceStore>> {
    let store = match dir {
        Some(dir) => {
            let id = source_id(&site.name, &site.lang, 1);
            PreferenceStore::load(PreferenceStore::path_for(dir, id)).await?
        }
        None => PreferenceStore::in_memory(),
    };
    Ok(Arc::new(store))
}

/// Instantiate one source for a configured site
pub async fn build_source(
    site: &SiteConfig,
    settings: &AppSettings,
    transport: Arc<dyn Transport>,
    extractors: Arc<ExtractorRegistry>,
    prefs_dir: Option<&Path>,
) -> Result<Arc<dyn AnimeSource>> {
    let prefs = preferences(site, prefs_dir).await?;
    let source: Arc<dyn AnimeSource> = match site.kind {
        SiteKind::AnimeStream => {
            let scraper = AnimeStream::new(&site.name, &site.base_url, &site.lang, extractors, prefs)
                .with_passphrase(site.embed_passphrase.clone())
                .with_concurrency(settings.concurrency);
            Arc::new(ScraperSource::new(scraper, transport))
        }
        SiteKind::Livewire => Arc::new(
            LivewireCatalog::new(
                &site.name,
                &site.base_url,
                &site.lang,
                site.component.clone(),
                transport,
                extractors,
                prefs,
            )
            .with_concurrency(settings.concurrency),
        ),
        SiteKind::AnilistMirror => {
            let mirror = AniListMirror::new(&site.name, &site.base_url, &site.lang, transport.clone(), extractors)
                .with_signing_secret(site.signing_secret.as_deref())
                .with_concurrency(settings.concurrency);
            Arc::new(AniListAnimeHttpSource::new(mirror, transport, prefs))
        }
    };
    Ok(source)
}

/// Every configured site, in configuration order
pub async fn build_registry(
    settings: &AppSettings,
    transport: Arc<dyn Transport>,
    extractors: Arc<ExtractorRegistry>,
    prefs_dir: Option<&Path>,
) -> Result<SourceRegistry> {
    let mut registry = SourceRegistry::default();
    for site in &settings.sites {
        let source = build_source(site, settings, transport.clone(), extractors.clone(), prefs_dir).await?;
        info!("Registered {} ({:?}) id={}", source.name(), site.kind, source.id());
        registry.register(source);
    }
    Ok(registry)
}

impl SourceRegistry {
    /// Registry for `settings` with preferences under the user config dir
    pub async fn from_settings(
        settings: &AppSettings,
        transport: Arc<dyn Transport>,
        extractors: Arc<ExtractorRegistry>,
    ) -> Result<Self> {
        build_registry(settings, transport, extractors, Some(&prefs_dir())).await
    }
}
