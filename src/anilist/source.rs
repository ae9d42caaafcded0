use crate::anilist::dto::{GraphQlResponse, Media, MediaData, PageData};
use crate::anilist::{filters, queries};
use crate::model::{Anime, AnimeStatus, AnimesPage, Episode, FilterList, Video};
use crate::network::{HttpRequest, Transport};
use crate::preferences::{sort_videos, PreferenceDef, PreferenceStore, PREF_QUALITY_KEY, PREF_SERVER_KEY};
use crate::source::AnimeSource;
use crate::utils::error::SourceError;
use crate::utils::text::{slug_from_url, strip_html};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

pub const ANILIST_ENDPOINT: &str = "https://graphql.anilist.co";
pub const PREF_TITLE_KEY: &str = "title_language";

/// Site-specific half of an AniList-backed source
#[async_trait]
pub trait AniListProvider: Send + Sync {
    fn name(&self) -> &str;
    fn lang(&self) -> &str;
    fn base_url(&self) -> &str;

    fn per_page(&self) -> u32 {
        20
    }

    /// Source URL stored for a media entry
    fn anime_url(&self, media: &Media) -> String {
        format!("/anime/{}", media.id)
    }

    /// AniList id back from a stored URL
    fn media_id(&self, anime: &Anime) -> Option<i64> {
        slug_from_url(&anime.url).parse().ok()
    }

    async fn episodes(&self, media_id: i64, anime: &Anime) -> Result<Vec<Episode>>;

    async fn videos(&self, episode: &Episode) -> Result<Vec<Video>>;

    /// Extra preferences on top of title language and quality
    fn preference_screen(&self) -> Vec<PreferenceDef> {
        Vec::new()
    }
}

/// Catalog from AniList, episodes and videos from the provider
pub struct AniListAnimeHttpSource<P> {
    provider: P,
    transport: Arc<dyn Transport>,
    prefs: Arc<PreferenceStore>,
    endpoint: String,
}

impl<P: AniListProvider> AniListAnimeHttpSource<P> {
    pub fn new(provider: P, transport: Arc<dyn Transport>, prefs: Arc<PreferenceStore>) -> Self {
        Self {
            provider,
            transport,
            prefs,
            endpoint: ANILIST_ENDPOINT.to_string(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn graphql<T: DeserializeOwned>(&self, query: String, variables: Map<String, Value>) -> Result<T> {
        let logged = serde_json::Value::Object(variables.clone());
        debug!("[{}] AniList query with {}", self.provider.name(), logged);
        let request = HttpRequest::post_json(&self.endpoint, &json!({ "query": query, "variables": variables }))?
            .with_header("Accept", "application/json");
        let response = self
            .transport
            .execute(request)
            .await
            .context("AniList request failed")?;

        // AniList reports query errors with a 4xx status and a JSON body
        let body: GraphQlResponse<T> = match response.parse_as() {
            Ok(body) => body,
            Err(e) => {
                response.error_for_status()?;
                return Err(e);
            }
        };
        if !body.errors.is_empty() {
            let messages: Vec<&str> = body.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(SourceError::GraphQl(messages.join("; ")).into());
        }
        body.data
            .ok_or_else(|| SourceError::GraphQl("response has no data".into()).into())
    }

    async fn page(&self, variables: Map<String, Value>) -> Result<AnimesPage> {
        let data: PageData = self.graphql(queries::search_query(), variables).await?;
        let animes = data.page.media.iter().map(|m| self.to_anime(m)).collect();
        Ok(AnimesPage::new(animes, data.page.page_info.has_next_page))
    }

    fn title_of(&self, media: &Media) -> String {
        let romaji = media.title.romaji.clone().unwrap_or_default();
        let preferred = match self.prefs.get_string(PREF_TITLE_KEY, "romaji").as_str() {
            "english" => media.title.english.clone(),
            "native" => media.title.native.clone(),
            _ => None,
        };
        preferred.filter(|t| !t.is_empty()).unwrap_or(romaji)
    }

    /// Listing entry for a media
    pub fn to_anime(&self, media: &Media) -> Anime {
        let mut anime = Anime::new(self.provider.anime_url(media), self.title_of(media));
        anime.thumbnail_url = media.cover();
        anime
    }

    /// Fully populated entry for a media
    pub fn to_details(&self, media: &Media) -> Anime {
        let mut anime = self.to_anime(media);
        anime.description = media.description.as_deref().map(strip_html).filter(|d| !d.is_empty());
        if !media.genres.is_empty() {
            anime.genre = Some(media.genres.join(", "));
        }
        let studios = media.main_studios();
        if !studios.is_empty() {
            anime.author = Some(studios.join(", "));
        }
        anime.status = match media.status.as_deref() {
            Some("RELEASING") => AnimeStatus::Ongoing,
            Some("FINISHED") => AnimeStatus::Completed,
            Some("HIATUS") => AnimeStatus::OnHiatus,
            Some("CANCELLED") => AnimeStatus::Cancelled,
            _ => AnimeStatus::Unknown,
        };
        anime.initialized = true;
        anime
    }
}

#[async_trait]
impl<P: AniListProvider> AnimeSource for AniListAnimeHttpSource<P> {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn lang(&self) -> &str {
        self.provider.lang()
    }

    fn base_url(&self) -> &str {
        self.provider.base_url()
    }

    async fn popular(&self, page: u32) -> Result<AnimesPage> {
        self.page(filters::page_variables(page, self.provider.per_page(), &["POPULARITY_DESC"]))
            .await
    }

    async fn latest(&self, page: u32) -> Result<AnimesPage> {
        let mut vars = filters::page_variables(page, self.provider.per_page(), &["START_DATE_DESC"]);
        vars.insert("status".into(), json!("RELEASING"));
        self.page(vars).await
    }

    async fn search(&self, page: u32, query: &str, filters: &FilterList) -> Result<AnimesPage> {
        self.page(filters::search_variables(page, self.provider.per_page(), query, filters))
            .await
    }

    async fn details(&self, anime: &Anime) -> Result<Anime> {
        let id = self
            .provider
            .media_id(anime)
            .ok_or_else(|| SourceError::parse(format!("no AniList id in {}", anime.url)))?;
        let mut vars = Map::new();
        vars.insert("id".into(), json!(id));
        let data: MediaData = self.graphql(queries::details_query(), vars).await?;
        let mut details = self.to_details(&data.media);
        details.url = anime.url.clone();
        Ok(details)
    }

    async fn episodes(&self, anime: &Anime) -> Result<Vec<Episode>> {
        let id = self
            .provider
            .media_id(anime)
            .ok_or_else(|| SourceError::parse(format!("no AniList id in {}", anime.url)))?;
        self.provider.episodes(id, anime).await
    }

    async fn videos(&self, episode: &Episode) -> Result<Vec<Video>> {
        let videos = self.provider.videos(episode).await?;
        Ok(sort_videos(
            videos,
            &self.prefs.get_string(PREF_QUALITY_KEY, "1080"),
            &self.prefs.get_string(PREF_SERVER_KEY, ""),
        ))
    }

    fn filter_list(&self) -> FilterList {
        filters::filter_list()
    }

    fn preference_screen(&self) -> Vec<PreferenceDef> {
        let mut screen = vec![
            PreferenceDef::List {
                key: PREF_TITLE_KEY.to_string(),
                title: "Title language".to_string(),
                entries: vec!["Romaji".into(), "English".into(), "Native".into()],
                entry_values: vec!["romaji".into(), "english".into(), "native".into()],
                default: "romaji".to_string(),
            },
            PreferenceDef::quality("1080"),
        ];
        screen.extend(self.provider.preference_screen());
        screen
    }
}
