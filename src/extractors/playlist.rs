//! HLS master playlist expansion

use crate::model::{Track, Video};
use crate::network::document::abs_url;
use crate::network::{HttpRequest, Transport};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// One `#EXT-X-STREAM-INF` entry
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub uri: String,
    pub bandwidth: Option<u64>,
    pub height: Option<u32>,
}

impl Variant {
    fn label(&self) -> String {
        match (self.height, self.bandwidth) {
            (Some(h), _) => format!("{h}p"),
            (None, Some(bw)) => format!("{}kbps", bw / 1000),
            (None, None) => "Video".to_string(),
        }
    }
}

/// Parsed master playlist
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterPlaylist {
    pub variants: Vec<Variant>,
    pub audio: Vec<Track>,
    pub subtitles: Vec<Track>,
}

/// Split an attribute list, honouring quoted values that contain commas
pub fn parse_attributes(list: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut quoted = false;

    for ch in list.chars() {
        match ch {
            '"' if in_value => quoted = !quoted,
            '=' if !in_value => in_value = true,
            ',' if !quoted => {
                if !key.is_empty() {
                    out.push((key.trim().to_string(), value.clone()));
                }
                key.clear();
                value.clear();
                in_value = false;
            }
            _ if in_value => value.push(ch),
            _ => key.push(ch),
        }
    }
    if !key.is_empty() {
        out.push((key.trim().to_string(), value));
    }
    out
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Parse a playlist body; `None` when it is a media (non-master) playlist
pub fn parse_master(base_url: &str, body: &str) -> Option<MasterPlaylist> {
    if !body.contains("#EXT-X-STREAM-INF") {
        return None;
    }
    let mut playlist = MasterPlaylist::default();
    let mut pending: Option<Vec<(String, String)>> = None;

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            pending = Some(parse_attributes(rest));
        } else if let Some(rest) = line.strip_prefix("#EXT-X-MEDIA:") {
            let attrs = parse_attributes(rest);
            let (Some(kind), Some(uri)) = (attr(&attrs, "TYPE"), attr(&attrs, "URI")) else {
                continue;
            };
            let lang = attr(&attrs, "NAME")
                .or_else(|| attr(&attrs, "LANGUAGE"))
                .unwrap_or("Unknown")
                .to_string();
            let track = Track::new(abs_url(base_url, uri), lang);
            match kind {
                "AUDIO" => playlist.audio.push(track),
                "SUBTITLES" => playlist.subtitles.push(track),
                _ => {}
            }
        } else if !line.starts_with('#') {
            if let Some(attrs) = pending.take() {
                let height = attr(&attrs, "RESOLUTION")
                    .and_then(|r| r.split_once('x'))
                    .and_then(|(_, h)| h.parse().ok());
                let bandwidth = attr(&attrs, "BANDWIDTH").and_then(|b| b.parse().ok());
                playlist.variants.push(Variant {
                    uri: abs_url(base_url, line),
                    bandwidth,
                    height,
                });
            }
        }
    }
    Some(playlist)
}

/// Turn a playlist body into videos, best quality first
pub fn videos_from_playlist(
    master_url: &str,
    body: &str,
    prefix: &str,
    referer: Option<&str>,
) -> Vec<Video> {
    let with_headers = |video: Video| match referer {
        Some(r) => video
            .with_header("Referer", r)
            .with_header("Origin", origin_of(r)),
        None => video,
    };

    let Some(master) = parse_master(master_url, body) else {
        return vec![with_headers(Video::new(master_url, format!("{prefix}Default"), master_url))];
    };

    let mut seen = HashSet::new();
    let mut variants: Vec<&Variant> = master
        .variants
        .iter()
        .filter(|v| seen.insert(v.uri.clone()))
        .collect();
    variants.sort_by_key(|v| std::cmp::Reverse((v.height.unwrap_or(0), v.bandwidth.unwrap_or(0))));

    variants
        .into_iter()
        .map(|variant| {
            let mut video = with_headers(Video::new(
                master_url,
                format!("{prefix}{}", variant.label()),
                variant.uri.clone(),
            ));
            video.audio_tracks = master.audio.clone();
            video.subtitle_tracks = master.subtitles.clone();
            video
        })
        .collect()
}

fn origin_of(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_else(|_| url.trim_end_matches('/').to_string())
}

/// Fetches master playlists and expands them into videos
#[derive(Clone)]
pub struct PlaylistUtils {
    transport: Arc<dyn Transport>,
}

impl PlaylistUtils {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn extract_from_hls(
        &self,
        master_url: &str,
        prefix: &str,
        referer: Option<&str>,
    ) -> Result<Vec<Video>> {
        let mut request = HttpRequest::GET(master_url)?;
        if let Some(r) = referer {
            request = request
                .with_header("Referer", r)
                .with_header("Origin", origin_of(r));
        }
        let response = self
            .transport
            .execute(request)
            .await
            .with_context(|| format!("Failed to fetch playlist {master_url}"))?
            .error_for_status()?;
        debug!("Fetched playlist {} ({} bytes)", master_url, response.body.len());
        Ok(videos_from_playlist(&response.url, response.text(), prefix, referer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"Japanese\",LANGUAGE=\"ja\",URI=\"audio/ja.m3u8\"
#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"subs\",NAME=\"English\",LANGUAGE=\"en\",URI=\"subs/en.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360,CODECS=\"avc1.4d401e,mp4a.40.2\"
360/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080,CODECS=\"avc1.640028,mp4a.40.2\"
1080/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720
https://cdn2.example/720/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720
https://cdn2.example/720/index.m3u8
";

    #[test]
    fn test_parse_attributes_with_quoted_commas() {
        let attrs = parse_attributes("BANDWIDTH=1,CODECS=\"a,b\",RESOLUTION=2x3");
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[1], ("CODECS".to_string(), "a,b".to_string()));
    }

    #[test]
    fn test_master_variants_sorted_and_resolved() {
        let videos = videos_from_playlist(
            "https://cdn.example/hls/master.m3u8",
            MASTER,
            "Filemoon - ",
            Some("https://filemoon.sx/e/abc"),
        );
        let labels: Vec<_> = videos.iter().map(|v| v.quality.as_str()).collect();
        assert_eq!(labels, vec!["Filemoon - 1080p", "Filemoon - 720p", "Filemoon - 360p"]);
        assert_eq!(videos[0].video_url, "https://cdn.example/hls/1080/index.m3u8");
        assert_eq!(videos[0].headers.get("Origin").unwrap(), "https://filemoon.sx");
        assert_eq!(videos[0].audio_tracks[0].url, "https://cdn.example/hls/audio/ja.m3u8");
        assert_eq!(videos[0].subtitle_tracks[0].lang, "English");
    }

    #[test]
    fn test_media_playlist_is_single_video() {
        let body = "#EXTM3U\n#EXTINF:10,\nseg0.ts\n#EXT-X-ENDLIST\n";
        let videos = videos_from_playlist("https://cdn.example/a.m3u8", body, "", None);
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].quality, "Default");
        assert!(videos[0].headers.is_empty());
    }

    #[test]
    fn test_bandwidth_only_label() {
        let body = "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1500000\nlow.m3u8\n";
        let videos = videos_from_playlist("https://cdn.example/m.m3u8", body, "", None);
        assert_eq!(videos[0].quality, "1500kbps");
    }
}
