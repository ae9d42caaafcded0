use crate::extractors::sniffer::sniff_server;
use crate::extractors::traits::VideoExtractor;
use crate::model::Video;
use crate::network::par_map;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An embed found on an episode page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLink {
    pub url: String,
    /// Site's own label for the mirror ("Sub - Filemoon")
    pub label: String,
}

impl ServerLink {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// The extractor registry
///
/// Holds the available extractors and routes each embed to the first one
/// that supports it, falling back to the generic extractor when a
/// specialised one fails.
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn VideoExtractor>>,
    fallback: Arc<dyn VideoExtractor>,
}

impl ExtractorRegistry {
    /// Create a new registry with the given extractors and fallback
    pub fn new(extractors: Vec<Arc<dyn VideoExtractor>>, fallback: Arc<dyn VideoExtractor>) -> Self {
        Self {
            extractors,
            fallback,
        }
    }

    /// Find the best extractor for a server
    fn find_extractor(&self, link: &ServerLink) -> Option<&Arc<dyn VideoExtractor>> {
        if let Some(extractor) = self.extractors.iter().find(|e| e.supports(&link.url)) {
            debug!("Routing {} to extractor: {}", link.url, extractor.id());
            return Some(extractor);
        }
        // Rotating domains: trust the label when the URL is unrecognisable
        if let Some(host) = sniff_server(&link.url, &link.label) {
            if let Some(extractor) = self.extractors.iter().find(|e| e.hosts().contains(&host)) {
                debug!("Routing {} by label {:?} to {}", link.url, link.label, extractor.id());
                return Some(extractor);
            }
        }
        if self.fallback.supports(&link.url) {
            debug!("Routing to fallback extractor: {}", self.fallback.id());
            return Some(&self.fallback);
        }
        None
    }

    pub fn supports(&self, link: &ServerLink) -> bool {
        self.find_extractor(link).is_some()
    }

    /// Resolve one server; failures are logged and yield no videos
    pub async fn resolve(&self, link: &ServerLink, prefix: &str, referer: Option<&str>) -> Vec<Video> {
        let Some(extractor) = self.find_extractor(link) else {
            debug!("No extractor for {} ({})", link.url, link.label);
            return Vec::new();
        };

        match extractor.videos_from_url(&link.url, prefix, referer).await {
            Ok(videos) => videos,
            Err(e) => {
                // If a specialized extractor fails, try the fallback
                if extractor.id() != self.fallback.id() && self.fallback.supports(&link.url) {
                    info!(
                        "Primary extractor {} failed: {}. Retrying with fallback...",
                        extractor.id(),
                        e
                    );
                    match self.fallback.videos_from_url(&link.url, prefix, referer).await {
                        Ok(videos) => return videos,
                        Err(e) => warn!("Fallback failed for {}: {:#}", link.url, e),
                    }
                } else {
                    warn!("Extractor {} failed for {}: {:#}", extractor.id(), link.url, e);
                }
                Vec::new()
            }
        }
    }

    /// Resolve a server list concurrently; label prefixes come from `prefix_for`
    pub async fn resolve_all<F>(
        &self,
        links: Vec<ServerLink>,
        width: usize,
        referer: Option<&str>,
        prefix_for: F,
    ) -> Vec<Video>
    where
        F: Fn(&ServerLink) -> String,
    {
        let prefix_for = &prefix_for;
        par_map(links, width, |link| async move {
            let prefix = prefix_for(&link);
            self.resolve(&link, &prefix, referer).await
        })
        .await
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::sniffer::HostKind;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    struct Fixed {
        id: &'static str,
        hosts: &'static [HostKind],
        fail: bool,
    }

    #[async_trait]
    impl VideoExtractor for Fixed {
        fn id(&self) -> &'static str {
            self.id
        }
        fn hosts(&self) -> &'static [HostKind] {
            self.hosts
        }
        async fn videos_from_url(&self, url: &str, prefix: &str, _referer: Option<&str>) -> Result<Vec<Video>> {
            if self.fail {
                return Err(anyhow!("{} exploded", self.id));
            }
            Ok(vec![Video::new(url, format!("{prefix}{}", self.id), format!("{url}#stream"))])
        }
    }

    struct AnyUrl;

    #[async_trait]
    impl VideoExtractor for AnyUrl {
        fn id(&self) -> &'static str {
            "any"
        }
        fn hosts(&self) -> &'static [HostKind] {
            &[]
        }
        fn supports(&self, url: &str) -> bool {
            url.ends_with(".mp4")
        }
        async fn videos_from_url(&self, url: &str, prefix: &str, _referer: Option<&str>) -> Result<Vec<Video>> {
            Ok(vec![Video::new(url, format!("{prefix}direct"), url)])
        }
    }

    fn registry(fail_moon: bool) -> ExtractorRegistry {
        ExtractorRegistry::new(
            vec![
                Arc::new(Fixed { id: "moon", hosts: &[HostKind::Filemoon], fail: fail_moon }),
                Arc::new(Fixed { id: "tape", hosts: &[HostKind::StreamTape], fail: false }),
            ],
            Arc::new(AnyUrl),
        )
    }

    #[tokio::test]
    async fn test_routes_by_url() {
        let videos = registry(false)
            .resolve(&ServerLink::new("https://filemoon.sx/e/1", "Server 1"), "S1 - ", None)
            .await;
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].quality, "S1 - moon");
    }

    #[tokio::test]
    async fn test_routes_by_label_when_domain_unknown() {
        let videos = registry(false)
            .resolve(&ServerLink::new("https://xyz123.example/e/1", "StreamTape"), "", None)
            .await;
        assert_eq!(videos[0].quality, "tape");
    }

    #[tokio::test]
    async fn test_failure_falls_back_or_yields_empty() {
        let reg = registry(true);
        let fallback = reg
            .resolve(&ServerLink::new("https://filemoon.sx/video.mp4", "FM"), "", None)
            .await;
        assert_eq!(fallback[0].quality, "direct");

        let empty = reg
            .resolve(&ServerLink::new("https://filemoon.sx/e/1", "FM"), "", None)
            .await;
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_all_keeps_order_and_skips_unknown() {
        let links = vec![
            ServerLink::new("https://streamtape.com/e/a", "Tape"),
            ServerLink::new("https://unknown.example/e/b", "Mystery"),
            ServerLink::new("https://filemoon.sx/e/c", "Moon"),
        ];
        let videos = registry(false)
            .resolve_all(links, 2, None, |link| format!("{} - ", link.label))
            .await;
        let labels: Vec<_> = videos.iter().map(|v| v.quality.as_str()).collect();
        assert_eq!(labels, vec!["Tape - tape", "Moon - moon"]);
    }
}
