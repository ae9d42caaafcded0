use crate::extractors::sniffer::{sniff, HostKind};
use crate::model::Video;
use anyhow::Result;
use async_trait::async_trait;

/// Core trait for all video extractors
///
/// An extractor turns a third-party embed URL into direct streams. Sources
/// never call hosts themselves; they hand embed URLs to the registry.
#[async_trait]
pub trait VideoExtractor: Send + Sync {
    /// Returns a unique identifier for this extractor (e.g., "filemoon", "direct")
    fn id(&self) -> &'static str;

    /// Hosts this extractor understands
    fn hosts(&self) -> &'static [HostKind];

    /// Checks if this extractor can handle the given URL
    fn supports(&self, url: &str) -> bool {
        sniff(url).is_some_and(|host| self.hosts().contains(&host))
    }

    /// Resolve streams; `prefix` is prepended to every quality label
    async fn videos_from_url(
        &self,
        url: &str,
        prefix: &str,
        referer: Option<&str>,
    ) -> Result<Vec<Video>>;
}
