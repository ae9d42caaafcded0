//! Deserialization targets mirroring AniList responses

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PageData {
    #[serde(rename = "Page")]
    pub page: PageResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub current_page: u32,
}

#[derive(Debug, Deserialize)]
pub struct MediaData {
    #[serde(rename = "Media")]
    pub media: Media,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Media {
    pub id: i64,
    pub id_mal: Option<i64>,
    pub title: MediaTitle,
    pub cover_image: Option<CoverImage>,
    pub description: Option<String>,
    pub genres: Vec<String>,
    pub studios: Option<Studios>,
    pub status: Option<String>,
    pub season: Option<String>,
    pub season_year: Option<i32>,
    pub format: Option<String>,
    pub episodes: Option<u32>,
    pub next_airing_episode: Option<AiringEpisode>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct MediaTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoverImage {
    pub extra_large: Option<String>,
    pub large: Option<String>,
    pub medium: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Studios {
    pub edges: Vec<StudioEdge>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioEdge {
    pub is_main: bool,
    pub node: Studio,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Studio {
    pub name: String,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiringEpisode {
    pub episode: u32,
    pub airing_at: i64,
}

impl Media {
    pub fn cover(&self) -> Option<String> {
        let cover = self.cover_image.as_ref()?;
        [&cover.extra_large, &cover.large, &cover.medium]
            .into_iter()
            .flatten()
            .find(|u| !u.is_empty())
            .cloned()
    }

    /// Names of the main studios
    pub fn main_studios(&self) -> Vec<&str> {
        self.studios
            .iter()
            .flat_map(|s| s.edges.iter())
            .filter(|e| e.is_main)
            .map(|e| e.node.name.as_str())
            .collect()
    }

    /// Episodes aired so far, when AniList knows
    pub fn aired_episodes(&self) -> Option<u32> {
        match self.next_airing_episode {
            Some(next) => Some(next.episode.saturating_sub(1)),
            None => self.episodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_nulls_tolerated() {
        let json = r#"{"id": 21, "idMal": null, "title": {"romaji": "One Piece", "english": null},
            "coverImage": {"extraLarge": null, "large": "https://img/l.jpg", "medium": "https://img/m.jpg"},
            "genres": ["Action"], "studios": {"edges": [{"isMain": false, "node": {"name": "Aniplex"}},
            {"isMain": true, "node": {"name": "Toei Animation"}}]}, "nextAiringEpisode": {"episode": 1100, "airingAt": 1}}"#;
        let media: Media = serde_json::from_str(json).unwrap();
        assert_eq!(media.cover().as_deref(), Some("https://img/l.jpg"));
        assert_eq!(media.main_studios(), vec!["Toei Animation"]);
        assert_eq!(media.aired_episodes(), Some(1099));
        assert!(media.description.is_none());
    }
}
