//! Preference screen definitions and preference-driven video ordering

use crate::model::Video;
use serde::{Deserialize, Serialize};

pub const PREF_QUALITY_KEY: &str = "preferred_quality";
pub const PREF_SERVER_KEY: &str = "preferred_server";

/// One entry of a source's settings screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PreferenceDef {
    List {
        key: String,
        title: String,
        entries: Vec<String>,
        entry_values: Vec<String>,
        default: String,
    },
    Switch {
        key: String,
        title: String,
        default: bool,
    },
    EditText {
        key: String,
        title: String,
        default: String,
    },
}

impl PreferenceDef {
    pub fn key(&self) -> &str {
        match self {
            PreferenceDef::List { key, .. }
            | PreferenceDef::Switch { key, .. }
            | PreferenceDef::EditText { key, .. } => key,
        }
    }

    /// The usual quality picker
    pub fn quality(default: &str) -> Self {
        let qualities = ["1080p", "720p", "480p", "360p"];
        PreferenceDef::List {
            key: PREF_QUALITY_KEY.to_string(),
            title: "Preferred quality".to_string(),
            entries: qualities.iter().map(|q| q.to_string()).collect(),
            entry_values: qualities.iter().map(|q| q.trim_end_matches('p').to_string()).collect(),
            default: default.to_string(),
        }
    }

    /// Server picker over the given display names
    pub fn server(servers: &[&str], default: &str) -> Self {
        PreferenceDef::List {
            key: PREF_SERVER_KEY.to_string(),
            title: "Preferred server".to_string(),
            entries: servers.iter().map(|s| s.to_string()).collect(),
            entry_values: servers.iter().map(|s| s.to_string()).collect(),
            default: default.to_string(),
        }
    }
}

/// Stable sort: preferred quality first, then preferred server, then higher resolution
pub fn sort_videos(mut videos: Vec<Video>, quality: &str, server: &str) -> Vec<Video> {
    let server = server.to_lowercase();
    videos.sort_by_key(|video| {
        let label = video.quality.to_lowercase();
        let quality_miss = quality.is_empty() || !label.contains(&quality.to_lowercase());
        let server_miss = server.is_empty() || !label.contains(&server);
        (
            quality_miss,
            server_miss,
            std::cmp::Reverse(video.height().unwrap_or(0)),
        )
    });
    videos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(label: &str) -> Video {
        Video::new("", label, format!("https://cdn.example/{label}"))
    }

    #[test]
    fn test_sort_prefers_quality_then_server() {
        let videos = vec![v("Voe - 480p"), v("Filemoon - 720p"), v("Voe - 1080p"), v("Filemoon - 1080p")];
        let sorted = sort_videos(videos, "1080", "filemoon");
        let labels: Vec<_> = sorted.iter().map(|v| v.quality.as_str()).collect();
        assert_eq!(labels, vec!["Filemoon - 1080p", "Voe - 1080p", "Filemoon - 720p", "Voe - 480p"]);
    }

    #[test]
    fn test_sort_without_preferences_orders_by_height() {
        let sorted = sort_videos(vec![v("360p"), v("Default"), v("720p")], "", "");
        let labels: Vec<_> = sorted.iter().map(|v| v.quality.as_str()).collect();
        assert_eq!(labels, vec!["720p", "360p", "Default"]);
    }

    #[test]
    fn test_quality_pref_values() {
        match PreferenceDef::quality("720") {
            PreferenceDef::List { entry_values, default, .. } => {
                assert_eq!(entry_values, vec!["1080", "720", "480", "360"]);
                assert_eq!(default, "720");
            }
            _ => panic!("expected list preference"),
        }
    }
}
