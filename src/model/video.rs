//! Data structures for resolved streams

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Subtitle or alternate audio track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub url: String,
    pub lang: String,
}

impl Track {
    pub fn new(url: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            lang: lang.into(),
        }
    }
}

/// A playable stream handed to the host player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Page or embed the stream was resolved from
    pub url: String,
    /// Display label, e.g. "Filemoon - 1080p"
    pub quality: String,
    /// Direct stream URL
    pub video_url: String,
    /// Headers the player must send (Referer, Origin, cookies)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub subtitle_tracks: Vec<Track>,
    #[serde(default)]
    pub audio_tracks: Vec<Track>,
}

impl Video {
    pub fn new(
        url: impl Into<String>,
        quality: impl Into<String>,
        video_url: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            quality: quality.into(),
            video_url: video_url.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    /// Vertical resolution parsed from the quality label ("1080p" → 1080)
    pub fn height(&self) -> Option<u32> {
        self.quality
            .split(|c: char| !c.is_ascii_alphanumeric())
            .find_map(|token| token.strip_suffix('p').and_then(|n| n.parse().ok()))
    }
}
