//! Hosts whose player config hides inside a packed script
//! (Filemoon, StreamWish, VidHide and their many mirrors)

use crate::extractors::hosts::fetch_page;
use crate::extractors::playlist::PlaylistUtils;
use crate::extractors::sniffer::HostKind;
use crate::extractors::traits::VideoExtractor;
use crate::extractors::unpacker;
use crate::model::Video;
use crate::network::document::abs_url;
use crate::network::Transport;
use crate::utils::error::SourceError;
use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref FILE_URL: Regex =
        Regex::new(r#"(?:file|src)\s*:\s*["']([^"']+\.(?:m3u8|mp4)[^"']*)["']"#).unwrap();
    static ref HLS_LINK: Regex = Regex::new(r#""hls\d?"\s*:\s*"([^"]+)""#).unwrap();
    static ref IFRAME: Regex = Regex::new(r#"<iframe[^>]+src\s*=\s*["']([^"']+)["']"#).unwrap();
}

/// Find the stream URL in (possibly packed) player markup
pub fn stream_url(html: &str) -> Option<String> {
    let script = match unpacker::find_packed(html).and_then(unpacker::unpack) {
        Some(unpacked) => unpacked,
        None => html.to_string(),
    };
    HLS_LINK
        .captures(&script)
        .or_else(|| FILE_URL.captures(&script))
        .map(|c| c[1].replace("\\/", "/"))
}

pub struct PackedPlayerExtractor {
    id: &'static str,
    hosts: &'static [HostKind],
    transport: Arc<dyn Transport>,
    playlists: PlaylistUtils,
}

impl PackedPlayerExtractor {
    pub fn new(
        id: &'static str,
        hosts: &'static [HostKind],
        transport: Arc<dyn Transport>,
        playlists: PlaylistUtils,
    ) -> Self {
        Self {
            id,
            hosts,
            transport,
            playlists,
        }
    }

    pub fn filemoon(transport: Arc<dyn Transport>, playlists: PlaylistUtils) -> Self {
        Self::new("filemoon", &[HostKind::Filemoon], transport, playlists)
    }

    pub fn streamwish(transport: Arc<dyn Transport>, playlists: PlaylistUtils) -> Self {
        Self::new("streamwish", &[HostKind::StreamWish], transport, playlists)
    }

    pub fn vidhide(transport: Arc<dyn Transport>, playlists: PlaylistUtils) -> Self {
        Self::new("vidhide", &[HostKind::VidHide, HostKind::FileLions], transport, playlists)
    }

    fn label(&self) -> &'static str {
        self.hosts.first().map(HostKind::label).unwrap_or("Video")
    }
}

#[async_trait]
impl VideoExtractor for PackedPlayerExtractor {
    fn id(&self) -> &'static str {
        self.id
    }

    fn hosts(&self) -> &'static [HostKind] {
        self.hosts
    }

    async fn videos_from_url(&self, url: &str, prefix: &str, referer: Option<&str>) -> Result<Vec<Video>> {
        let mut page = fetch_page(self.transport.as_ref(), url, referer).await?;
        let mut page_url = url.to_string();

        // Landing pages wrap the real player in one iframe
        if stream_url(page.text()).is_none() {
            if let Some(inner) = IFRAME.captures(page.text()).map(|c| abs_url(url, &c[1])) {
                debug!("[{}] following iframe {}", self.id, inner);
                page = fetch_page(self.transport.as_ref(), &inner, Some(url)).await?;
                page_url = inner;
            }
        }

        let stream = stream_url(page.text())
            .ok_or_else(|| SourceError::parse(format!("{}: no stream in player", self.id)))?;
        let stream = abs_url(&page_url, &stream);
        let label = format!("{prefix}{} - ", self.label());
        let player_referer = format!("{}/", origin(&page_url));

        if stream.contains(".m3u8") {
            self.playlists
                .extract_from_hls(&stream, &label, Some(&player_referer))
                .await
        } else {
            Ok(vec![Video::new(url, format!("{label}Default"), stream)
                .with_header("Referer", player_referer)])
        }
    }
}

fn origin(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_default()
}
