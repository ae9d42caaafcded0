use crate::model::{Anime, AnimesPage, Episode, FilterList, Video};
use crate::preferences::PreferenceDef;
use anyhow::Result;
use async_trait::async_trait;

/// Core trait for all anime sources
///
/// The host only ever sees this interface: listings, details, episodes,
/// videos, plus the filter and preference widgets it renders.
#[async_trait]
pub trait AnimeSource: Send + Sync {
    fn name(&self) -> &str;

    /// ISO 639-1 code, or "all"
    fn lang(&self) -> &str;

    fn base_url(&self) -> &str;

    /// Bumped when a source changes in a way that invalidates stored entries
    fn version_id(&self) -> u32 {
        1
    }

    /// Stable identifier derived from name, language and version
    fn id(&self) -> u64 {
        source_id(self.name(), self.lang(), self.version_id())
    }

    fn supports_latest(&self) -> bool {
        true
    }

    async fn popular(&self, page: u32) -> Result<AnimesPage>;

    async fn latest(&self, page: u32) -> Result<AnimesPage>;

    async fn search(&self, page: u32, query: &str, filters: &FilterList) -> Result<AnimesPage>;

    /// Full details; the returned entry keeps the input `url`
    async fn details(&self, anime: &Anime) -> Result<Anime>;

    async fn episodes(&self, anime: &Anime) -> Result<Vec<Episode>>;

    async fn videos(&self, episode: &Episode) -> Result<Vec<Video>>;

    fn filter_list(&self) -> FilterList {
        FilterList::default()
    }

    fn preference_screen(&self) -> Vec<PreferenceDef> {
        Vec::new()
    }
}

/// First 8 bytes of md5("name/lang/version") as a positive integer
pub fn source_id(name: &str, lang: &str, version: u32) -> u64 {
    let key = format!("{}/{}/{}", name.to_lowercase(), lang, version);
    let digest = md5::compute(key.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.0[..8]);
    u64::from_be_bytes(bytes) & (i64::MAX as u64)
}
