use crate::source::traits::AnimeSource;
use crate::utils::error::SourceError;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Ordered collection of installed sources
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn AnimeSource>>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Arc<dyn AnimeSource>>) -> Self {
        Self { sources }
    }

    pub fn register(&mut self, source: Arc<dyn AnimeSource>) {
        debug!("Registering source {} ({})", source.name(), source.id());
        self.sources.push(source);
    }

    pub fn all(&self) -> &[Arc<dyn AnimeSource>] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Lookup by numeric id, exact name, then case-insensitive name
    pub fn find(&self, key: &str) -> Option<Arc<dyn AnimeSource>> {
        if let Ok(id) = key.parse::<u64>() {
            if let Some(source) = self.sources.iter().find(|s| s.id() == id) {
                return Some(source.clone());
            }
        }
        self.sources
            .iter()
            .find(|s| s.name() == key)
            .or_else(|| self.sources.iter().find(|s| s.name().eq_ignore_ascii_case(key)))
            .cloned()
    }

    pub fn get(&self, key: &str) -> Result<Arc<dyn AnimeSource>> {
        self.find(key)
            .ok_or_else(|| SourceError::SourceNotFound(key.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Anime, AnimesPage, Episode, FilterList, Video};
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl AnimeSource for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn lang(&self) -> &str {
            "en"
        }
        fn base_url(&self) -> &str {
            "https://named.example"
        }
        async fn popular(&self, _page: u32) -> Result<AnimesPage> {
            Ok(AnimesPage::empty())
        }
        async fn latest(&self, _page: u32) -> Result<AnimesPage> {
            Ok(AnimesPage::empty())
        }
        async fn search(&self, _page: u32, _query: &str, _filters: &FilterList) -> Result<AnimesPage> {
            Ok(AnimesPage::empty())
        }
        async fn details(&self, anime: &Anime) -> Result<Anime> {
            Ok(anime.clone())
        }
        async fn episodes(&self, _anime: &Anime) -> Result<Vec<Episode>> {
            Ok(vec![])
        }
        async fn videos(&self, _episode: &Episode) -> Result<Vec<Video>> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_find_by_name_and_id() {
        let mut registry = SourceRegistry::default();
        registry.register(Arc::new(Named("Alpha")));
        registry.register(Arc::new(Named("beta")));

        assert_eq!(registry.find("Alpha").unwrap().name(), "Alpha");
        assert_eq!(registry.find("BETA").unwrap().name(), "beta");

        let id = registry.find("alpha").unwrap().id();
        assert_eq!(registry.find(&id.to_string()).unwrap().name(), "Alpha");
    }

    #[test]
    fn test_missing_source_errors() {
        let registry = SourceRegistry::default();
        let err = registry.get("nope").err().unwrap();
        assert!(err.to_string().contains("Source not found"));
    }
}
