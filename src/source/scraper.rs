//! Request/parse split for HTML and JSON scrapers

use crate::model::{Anime, AnimesPage, Episode, FilterList, Video};
use crate::network::document::abs_url;
use crate::network::{HttpRequest, HttpResponse, Transport};
use crate::preferences::PreferenceDef;
use crate::source::traits::AnimeSource;
use crate::utils::error::SourceError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A source expressed as pairs of request builders and response parsers
///
/// Parsers receive fully buffered responses and must not fail on missing
/// optional markup; they fall back to empty values instead.
#[async_trait]
pub trait CatalogScraper: Send + Sync {
    fn name(&self) -> &str;
    fn lang(&self) -> &str;
    fn base_url(&self) -> &str;

    fn supports_latest(&self) -> bool {
        true
    }

    /// Headers attached to every request unless the request already sets them
    fn headers(&self) -> Vec<(String, String)> {
        vec![("Referer".to_string(), format!("{}/", self.base_url().trim_end_matches('/')))]
    }

    fn popular_request(&self, page: u32) -> Result<HttpRequest>;
    fn popular_parse(&self, response: &HttpResponse) -> Result<AnimesPage>;

    fn latest_request(&self, _page: u32) -> Result<HttpRequest> {
        Err(SourceError::Unsupported(format!("{} has no latest listing", self.name())).into())
    }

    fn latest_parse(&self, response: &HttpResponse) -> Result<AnimesPage> {
        self.popular_parse(response)
    }

    fn search_request(&self, page: u32, query: &str, filters: &FilterList) -> Result<HttpRequest>;
    fn search_parse(&self, response: &HttpResponse) -> Result<AnimesPage>;

    fn details_request(&self, anime: &Anime) -> Result<HttpRequest> {
        HttpRequest::GET(&abs_url(self.base_url(), &anime.url))
    }
    fn details_parse(&self, response: &HttpResponse) -> Result<Anime>;

    fn episode_list_request(&self, anime: &Anime) -> Result<HttpRequest> {
        self.details_request(anime)
    }
    fn episode_list_parse(&self, response: &HttpResponse) -> Result<Vec<Episode>>;

    /// Keep the parsed episode order instead of sorting newest first
    fn keeps_episode_order(&self) -> bool {
        false
    }

    fn video_list_request(&self, episode: &Episode) -> Result<HttpRequest> {
        HttpRequest::GET(&abs_url(self.base_url(), &episode.url))
    }

    /// Usually resolves embeds through extractors, hence async
    async fn video_list_parse(&self, response: &HttpResponse) -> Result<Vec<Video>>;

    /// Final ordering of videos, typically driven by preferences
    fn sort_videos(&self, videos: Vec<Video>) -> Vec<Video> {
        videos
    }

    fn filter_list(&self) -> FilterList {
        FilterList::default()
    }

    fn preference_screen(&self) -> Vec<PreferenceDef> {
        Vec::new()
    }
}

/// Drives a [`CatalogScraper`] through a [`Transport`]
pub struct ScraperSource<S> {
    scraper: S,
    transport: Arc<dyn Transport>,
}

impl<S: CatalogScraper> ScraperSource<S> {
    pub fn new(scraper: S, transport: Arc<dyn Transport>) -> Self {
        Self { scraper, transport }
    }

    pub fn scraper(&self) -> &S {
        &self.scraper
    }

    async fn fetch(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        for (name, value) in self.scraper.headers() {
            if !request.headers.keys().any(|k| k.eq_ignore_ascii_case(&name)) {
                request.headers.insert(name, value);
            }
        }
        let url = request.url.to_string();
        debug!("[{}] fetching {}", self.scraper.name(), url);
        self.transport
            .execute(request)
            .await
            .with_context(|| format!("{}: request to {} failed", self.scraper.name(), url))?
            .error_for_status()
    }
}

#[async_trait]
impl<S: CatalogScraper> AnimeSource for ScraperSource<S> {
    fn name(&self) -> &str {
        self.scraper.name()
    }

    fn lang(&self) -> &str {
        self.scraper.lang()
    }

    fn base_url(&self) -> &str {
        self.scraper.base_url()
    }

    fn supports_latest(&self) -> bool {
        self.scraper.supports_latest()
    }

    async fn popular(&self, page: u32) -> Result<AnimesPage> {
        let response = self.fetch(self.scraper.popular_request(page)?).await?;
        self.scraper.popular_parse(&response)
    }

    async fn latest(&self, page: u32) -> Result<AnimesPage> {
        let response = self.fetch(self.scraper.latest_request(page)?).await?;
        self.scraper.latest_parse(&response)
    }

    async fn search(&self, page: u32, query: &str, filters: &FilterList) -> Result<AnimesPage> {
        let request = self.scraper.search_request(page, query, filters)?;
        let response = self.fetch(request).await?;
        self.scraper.search_parse(&response)
    }

    async fn details(&self, anime: &Anime) -> Result<Anime> {
        let response = self.fetch(self.scraper.details_request(anime)?).await?;
        let mut details = self.scraper.details_parse(&response)?;
        details.url = anime.url.clone();
        if details.title.is_empty() {
            details.title = anime.title.clone();
        }
        if details.thumbnail_url.is_none() {
            details.thumbnail_url = anime.thumbnail_url.clone();
        }
        details.initialized = true;
        Ok(details)
    }

    async fn episodes(&self, anime: &Anime) -> Result<Vec<Episode>> {
        let response = self.fetch(self.scraper.episode_list_request(anime)?).await?;
        let mut episodes = self.scraper.episode_list_parse(&response)?;
        if !self.scraper.keeps_episode_order() {
            episodes.sort_by(|a, b| b.episode_number.total_cmp(&a.episode_number));
        }
        Ok(episodes)
    }

    async fn videos(&self, episode: &Episode) -> Result<Vec<Video>> {
        let response = self.fetch(self.scraper.video_list_request(episode)?).await?;
        let videos = self.scraper.video_list_parse(&response).await?;
        Ok(self.scraper.sort_videos(videos))
    }

    fn filter_list(&self) -> FilterList {
        self.scraper.filter_list()
    }

    fn preference_screen(&self) -> Vec<PreferenceDef> {
        self.scraper.preference_screen()
    }
}
