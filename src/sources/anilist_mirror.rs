//! Streaming mirrors keyed by AniList id
//!
//! Catalog data comes from AniList; the mirror only serves episode lists and
//! stream sources. Sources are fetched with the JWT the watch page embeds,
//! and manifests on the mirror's CDN must carry an HMAC signature.

use crate::anilist::AniListProvider;
use crate::extractors::playlist::videos_from_playlist;
use crate::extractors::{ExtractorRegistry, ServerLink};
use crate::model::{Anime, Episode, Track, Video};
use crate::network::document::abs_url;
use crate::network::{par_flat_map_catching, HttpRequest, HttpResponse, Transport};
use crate::signing::{find_jwt, Jwt, ManifestSigner, SignatureEncoding};
use crate::utils::error::SourceError;
use crate::utils::text::parse_date;
use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

lazy_static! {
    static ref WATCH_PATH: Regex = Regex::new(r"/watch/(\d+)/(\d+(?:\.\d+)?)").unwrap();
}

const AIRED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d"];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EpisodesResponse {
    Wrapped { episodes: Vec<EpisodeDto> },
    Bare(Vec<EpisodeDto>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodeDto {
    number: f32,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    aired_at: Option<String>,
    #[serde(default)]
    filler: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourcesResponse {
    token: Option<String>,
    sources: Vec<SourceDto>,
    tracks: Vec<TrackDto>,
}

#[derive(Debug, Clone, Deserialize)]
struct SourceDto {
    url: String,
    #[serde(default)]
    label: String,
    /// `hls`, `mp4` or `embed`
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    signed: bool,
}

#[derive(Debug, Deserialize)]
struct TrackDto {
    file: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    kind: String,
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Watch page path for an episode number (`/watch/21/12`, `/watch/21/12.5`)
pub fn watch_path(media_id: i64, number: f32) -> String {
    if number.fract() == 0.0 {
        format!("/watch/{media_id}/{}", number as i64)
    } else {
        format!("/watch/{media_id}/{number}")
    }
}

/// `(media id, episode number)` back from a watch path
pub fn parse_watch_path(url: &str) -> Option<(i64, String)> {
    let caps = WATCH_PATH.captures(url)?;
    Some((caps[1].parse().ok()?, caps[2].to_string()))
}

pub struct AniListMirror {
    name: String,
    base_url: String,
    lang: String,
    transport: Arc<dyn Transport>,
    extractors: Arc<ExtractorRegistry>,
    signer: Option<ManifestSigner>,
    clock: fn() -> i64,
    concurrency: usize,
}

impl AniListMirror {
    pub fn new(
        name: &str,
        base_url: &str,
        lang: &str,
        transport: Arc<dyn Transport>,
        extractors: Arc<ExtractorRegistry>,
    ) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: lang.to_string(),
            transport,
            extractors,
            signer: None,
            clock: now,
            concurrency: 4,
        }
    }

    pub fn with_signing_secret(mut self, secret: Option<&str>) -> Self {
        self.signer = secret
            .filter(|s| !s.is_empty())
            .map(|s| ManifestSigner::new(s, SignatureEncoding::Hex));
        self
    }

    /// Clock used for signatures and token expiry, in epoch seconds
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_concurrency(mut self, width: usize) -> Self {
        self.concurrency = width.max(1);
        self
    }

    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.to_string();
        self.transport
            .execute(request)
            .await
            .with_context(|| format!("{}: request to {} failed", self.name, url))?
            .error_for_status()
    }

    /// Bearer token from the watch page, if it carries a live one
    async fn watch_token(&self, watch_url: &str) -> Option<String> {
        let request = HttpRequest::GET(watch_url).ok()?.with_header("Referer", format!("{}/", self.base_url));
        let page = match self.fetch(request).await {
            Ok(page) => page,
            Err(e) => {
                warn!("[{}] watch page unavailable: {:#}", self.name, e);
                return None;
            }
        };
        let raw = find_jwt(page.text())?;
        match Jwt::decode(raw) {
            Ok(jwt) if jwt.is_expired((self.clock)()) => {
                warn!("[{}] watch page token already expired", self.name);
                None
            }
            Ok(jwt) => Some(jwt.raw),
            Err(e) => {
                debug!("[{}] token-like string is not a JWT: {:#}", self.name, e);
                None
            }
        }
    }

    fn manifest_url(&self, source: &SourceDto) -> Result<String> {
        let url = abs_url(&self.base_url, &source.url);
        match (&self.signer, source.signed) {
            (Some(signer), true) => signer.sign_url(&url, (self.clock)()),
            (None, true) => Err(SourceError::Unsupported(format!(
                "{} serves signed manifests but no signing secret is configured",
                self.name
            ))
            .into()),
            (_, false) => Ok(url),
        }
    }

    async fn videos_for_source(
        &self,
        source: SourceDto,
        token: Option<&str>,
        referer: &str,
    ) -> Result<Vec<Video>> {
        let label = if source.label.is_empty() { "Default".to_string() } else { source.label.clone() };
        let prefix = format!("{} - ", label);

        if source.kind == "embed" {
            let link = ServerLink::new(abs_url(&self.base_url, &source.url), label);
            return Ok(self.extractors.resolve(&link, &prefix, Some(referer)).await);
        }

        let url = self.manifest_url(&source)?;
        let with_auth = |video: Video| match token {
            Some(t) => video.with_header("Authorization", format!("Bearer {t}")),
            None => video,
        };

        if source.kind == "mp4" || (source.kind != "hls" && !url.contains(".m3u8")) {
            let video = Video::new(referer, label, url).with_header("Referer", referer);
            return Ok(vec![with_auth(video)]);
        }

        let mut request = HttpRequest::GET(&url)?.with_header("Referer", referer);
        if let Some(t) = token {
            request = request.with_header("Authorization", format!("Bearer {t}"));
        }
        let manifest = self.fetch(request).await?;
        let videos = videos_from_playlist(&manifest.url, manifest.text(), &prefix, Some(referer));
        let videos = match (&self.signer, source.signed) {
            (Some(signer), true) => self.sign_variants(signer, videos)?,
            _ => videos,
        };
        Ok(videos.into_iter().map(with_auth).collect())
    }

    /// Variant and track URIs resolve without the master's signature
    fn sign_variants(&self, signer: &ManifestSigner, videos: Vec<Video>) -> Result<Vec<Video>> {
        let now = (self.clock)();
        videos
            .into_iter()
            .map(|mut video| {
                video.video_url = signer.sign_url(&video.video_url, now)?;
                for track in video.subtitle_tracks.iter_mut().chain(video.audio_tracks.iter_mut()) {
                    track.url = signer.sign_url(&track.url, now)?;
                }
                Ok(video)
            })
            .collect()
    }
}

#[async_trait]
impl AniListProvider for AniListMirror {
    fn name(&self) -> &str {
        &self.name
    }

    fn lang(&self) -> &str {
        &self.lang
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn episodes(&self, media_id: i64, _anime: &Anime) -> Result<Vec<Episode>> {
        let url = format!("{}/api/anime/{}/episodes", self.base_url, media_id);
        let response = self.fetch(HttpRequest::GET(&url)?.with_header("Accept", "application/json")).await?;
        let dtos = match response.parse_as::<EpisodesResponse>()? {
            EpisodesResponse::Wrapped { episodes } | EpisodesResponse::Bare(episodes) => episodes,
        };

        let mut episodes: Vec<Episode> = dtos
            .into_iter()
            .map(|dto| {
                let name = match dto.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                    Some(title) => format!("Episode {}: {}", dto.number, title),
                    None => format!("Episode {}", dto.number),
                };
                let mut episode = Episode::new(watch_path(media_id, dto.number), name, dto.number);
                episode.date_upload = dto.aired_at.as_deref().map(|d| parse_date(d, AIRED_FORMATS)).unwrap_or(0);
                if dto.filler {
                    episode.scanlator = Some("Filler".to_string());
                }
                episode
            })
            .collect();
        episodes.sort_by(|a, b| b.episode_number.total_cmp(&a.episode_number));
        Ok(episodes)
    }

    async fn videos(&self, episode: &Episode) -> Result<Vec<Video>> {
        let (media_id, number) = parse_watch_path(&episode.url)
            .ok_or_else(|| SourceError::parse(format!("not a watch url: {}", episode.url)))?;
        let watch_url = abs_url(&self.base_url, &episode.url);
        let page_token = self.watch_token(&watch_url).await;

        let api = format!("{}/api/episode/{}/{}/sources", self.base_url, media_id, number);
        let mut request = HttpRequest::GET(&api)?
            .with_header("Referer", watch_url.clone())
            .with_header("Accept", "application/json");
        if let Some(t) = &page_token {
            request = request.with_header("Authorization", format!("Bearer {t}"));
        }
        let response = self.fetch(request).await?;
        let sources: SourcesResponse = response.parse_as()?;
        let now = (self.clock)();
        let token = sources
            .token
            .as_deref()
            .or_else(|| find_jwt(response.text()))
            .and_then(|raw| match Jwt::decode(raw) {
                Ok(jwt) if jwt.is_expired(now) => {
                    warn!("[{}] sources token already expired", self.name);
                    None
                }
                Ok(jwt) => Some(jwt.raw),
                Err(e) => {
                    debug!("[{}] sources token is not a JWT: {:#}", self.name, e);
                    None
                }
            })
            .or(page_token);
        debug!("[{}] {} sources for {}", self.name, sources.sources.len(), episode.url);

        let subtitles: Vec<Track> = sources
            .tracks
            .iter()
            .filter(|t| t.kind.is_empty() || t.kind == "captions" || t.kind == "subtitles")
            .map(|t| Track::new(abs_url(&self.base_url, &t.file), if t.label.is_empty() { "Unknown" } else { t.label.as_str() }))
            .collect();

        let token = token.as_deref();
        let referer = watch_url.as_str();
        let mut videos = par_flat_map_catching(sources.sources, self.concurrency, |source| {
            self.videos_for_source(source, token, referer)
        })
        .await;
        for video in &mut videos {
            if video.subtitle_tracks.is_empty() {
                video.subtitle_tracks = subtitles.clone();
            }
        }
        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_paths() {
        assert_eq!(watch_path(21, 12.0), "/watch/21/12");
        assert_eq!(watch_path(21, 12.5), "/watch/21/12.5");
        assert_eq!(parse_watch_path("https://m.example/watch/21/12.5"), Some((21, "12.5".to_string())));
        assert_eq!(parse_watch_path("/anime/21"), None);
    }

    #[test]
    fn test_episode_payload_shapes() {
        let wrapped: EpisodesResponse =
            serde_json::from_str(r#"{"episodes": [{"number": 1, "title": "Start", "airedAt": "2023-09-29"}]}"#).unwrap();
        assert!(matches!(wrapped, EpisodesResponse::Wrapped { ref episodes } if episodes.len() == 1));
        let bare: EpisodesResponse = serde_json::from_str(r#"[{"number": 2}, {"number": 3, "filler": true}]"#).unwrap();
        assert!(matches!(bare, EpisodesResponse::Bare(ref episodes) if episodes.len() == 2 && episodes[1].filler));
    }
}
