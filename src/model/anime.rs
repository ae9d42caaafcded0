//! Data structures for catalog entries and episodes

use serde::{Deserialize, Serialize};

/// Airing status as understood by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimeStatus {
    #[default]
    Unknown,
    Ongoing,
    Completed,
    Licensed,
    PublishingFinished,
    Cancelled,
    OnHiatus,
}

impl AnimeStatus {
    /// Map the free-form status labels sites print
    pub fn parse(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        let unfinished = ["unfinished", "not finished", "not completed", "incomplete"]
            .iter()
            .any(|negated| text.contains(negated));
        if unfinished || text.contains("ongoing") || text.contains("currently airing") || text.contains("releasing") {
            AnimeStatus::Ongoing
        } else if text.contains("complete") || text.contains("finished") {
            AnimeStatus::Completed
        } else if text.contains("airing") {
            AnimeStatus::Ongoing
        } else if text.contains("hiatus") {
            AnimeStatus::OnHiatus
        } else if text.contains("cancel") || text.contains("dropped") {
            AnimeStatus::Cancelled
        } else if text.contains("licensed") {
            AnimeStatus::Licensed
        } else {
            AnimeStatus::Unknown
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    /// Source-relative path or absolute URL
    pub url: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    /// Comma separated genres
    pub genre: Option<String>,
    pub author: Option<String>,
    pub artist: Option<String>,
    #[serde(default)]
    pub status: AnimeStatus,
    /// Whether details have been fetched
    #[serde(default)]
    pub initialized: bool,
}

impl Anime {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimesPage {
    pub animes: Vec<Anime>,
    pub has_next_page: bool,
}

impl AnimesPage {
    pub fn new(animes: Vec<Anime>, has_next_page: bool) -> Self {
        Self {
            animes,
            has_next_page,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// A playable unit of an anime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub url: String,
    pub name: String,
    /// -1 when unknown
    pub episode_number: f32,
    /// Epoch milliseconds, 0 when unknown
    #[serde(default)]
    pub date_upload: i64,
    pub scanlator: Option<String>,
}

impl Episode {
    pub fn new(url: impl Into<String>, name: impl Into<String>, episode_number: f32) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            episode_number,
            date_upload: 0,
            scanlator: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(AnimeStatus::parse("Ongoing"), AnimeStatus::Ongoing);
        assert_eq!(AnimeStatus::parse(" Currently Airing "), AnimeStatus::Ongoing);
        assert_eq!(AnimeStatus::parse("Finished Airing"), AnimeStatus::Completed);
        assert_eq!(AnimeStatus::parse("On Hiatus"), AnimeStatus::OnHiatus);
        assert_eq!(AnimeStatus::parse("Cancelled"), AnimeStatus::Cancelled);
        assert_eq!(AnimeStatus::parse("?"), AnimeStatus::Unknown);
        assert_eq!(AnimeStatus::parse("Unfinished"), AnimeStatus::Ongoing);
        assert_eq!(AnimeStatus::parse("Not Completed"), AnimeStatus::Ongoing);
        assert_eq!(AnimeStatus::parse("Incomplete"), AnimeStatus::Ongoing);
        assert_eq!(AnimeStatus::parse("Airing"), AnimeStatus::Ongoing);
    }

    #[test]
    fn test_anime_json_defaults() {
        let anime: Anime =
            serde_json::from_str(r#"{"url":"/a","title":"A","thumbnail_url":null,"description":null,"genre":null,"author":null,"artist":null}"#)
                .unwrap();
        assert_eq!(anime.status, AnimeStatus::Unknown);
        assert!(!anime.initialized);
    }
}
