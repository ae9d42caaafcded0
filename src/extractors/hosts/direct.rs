use crate::extractors::playlist::PlaylistUtils;
use crate::extractors::sniffer::HostKind;
use crate::extractors::traits::VideoExtractor;
use crate::model::Video;
use anyhow::Result;
use async_trait::async_trait;

/// URLs that already point at a stream (`.mp4`, `.m3u8`)
pub struct DirectExtractor {
    playlists: PlaylistUtils,
}

impl DirectExtractor {
    pub fn new(playlists: PlaylistUtils) -> Self {
        Self { playlists }
    }

    fn path_of(url: &str) -> String {
        url.split(['?', '#']).next().unwrap_or("").to_lowercase()
    }
}

#[async_trait]
impl VideoExtractor for DirectExtractor {
    fn id(&self) -> &'static str {
        "direct"
    }

    fn hosts(&self) -> &'static [HostKind] {
        &[]
    }

    fn supports(&self, url: &str) -> bool {
        let path = Self::path_of(url);
        path.ends_with(".m3u8") || path.ends_with(".mp4") || path.ends_with(".mkv")
    }

    async fn videos_from_url(&self, url: &str, prefix: &str, referer: Option<&str>) -> Result<Vec<Video>> {
        if Self::path_of(url).ends_with(".m3u8") {
            return self.playlists.extract_from_hls(url, prefix, referer).await;
        }
        let mut video = Video::new(url, format!("{prefix}Direct"), url);
        if let Some(r) = referer {
            video = video.with_header("Referer", r);
        }
        Ok(vec![video])
    }
}
