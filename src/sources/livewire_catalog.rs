//! Catalog sites whose listings are Livewire components
//!
//! The first page of a listing is a plain GET. Later pages are rendered by
//! the component itself, so the session picked up on page one is kept per
//! listing URL (query and filters included) and asked for the next page.

use crate::extractors::{ExtractorRegistry, ServerLink};
use crate::livewire::{LivewireSession, LivewireVersion};
use crate::model::filter::options;
use crate::model::{Anime, AnimeStatus, AnimesPage, Episode, Filter, FilterList, Video};
use crate::network::document::{abs_url, doc_text, element_text, image_url, relative_url, select_all_text, select_text, selector};
use crate::network::{HttpRequest, Transport};
use crate::preferences::{sort_videos, PreferenceDef, PreferenceStore, PREF_QUALITY_KEY, PREF_SERVER_KEY};
use crate::source::AnimeSource;
use crate::utils::error::SourceError;
use crate::utils::text::{parse_episode_number, strip_html};
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::Html;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Listing kinds; sessions are cached per resolved listing URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Listing {
    Popular,
    Latest,
    Search(String),
}

pub struct LivewireCatalog {
    name: String,
    base_url: String,
    lang: String,
    component: Option<String>,
    transport: Arc<dyn Transport>,
    extractors: Arc<ExtractorRegistry>,
    prefs: Arc<PreferenceStore>,
    concurrency: usize,
    sessions: Mutex<HashMap<String, LivewireSession>>,
}

/// Whether rendered markup offers a way to the next page
pub fn has_next_control(html: &str) -> bool {
    let doc = Html::parse_document(html);
    if doc.select(&selector("a[rel=next], [dusk=nextPage]")).next().is_some() {
        return true;
    }
    doc.select(&selector("*")).any(|el| {
        let attrs = el.value();
        attrs
            .attr("wire:click")
            .or_else(|| attrs.attr("wire:click.prevent"))
            .is_some_and(|action| action.contains("nextPage"))
            && attrs.attr("disabled").is_none()
    })
}

impl LivewireCatalog {
    pub fn new(
        name: &str,
        base_url: &str,
        lang: &str,
        component: Option<String>,
        transport: Arc<dyn Transport>,
        extractors: Arc<ExtractorRegistry>,
        prefs: Arc<PreferenceStore>,
    ) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: lang.to_string(),
            component,
            transport,
            extractors,
            prefs,
            concurrency: 4,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_concurrency(mut self, width: usize) -> Self {
        self.concurrency = width.max(1);
        self
    }

    fn listing_url(&self, listing: &Listing, filters: &FilterList) -> Result<String> {
        let request = match listing {
            Listing::Popular => HttpRequest::GET(&format!("{}/anime", self.base_url))?.with_query(&[("sort", "popular")]),
            Listing::Latest => HttpRequest::GET(&format!("{}/anime", self.base_url))?.with_query(&[("sort", "latest")]),
            Listing::Search(query) => {
                let mut pairs = vec![("search", query.as_str())];
                for (param, filter) in [("sort", "Sort"), ("status", "Status")] {
                    if let Some(value) = filters.selected(filter).filter(|v| !v.is_empty()) {
                        pairs.push((param, value));
                    }
                }
                for genre in filters.checked("Genres") {
                    pairs.push(("genres[]", genre));
                }
                HttpRequest::GET(&format!("{}/anime", self.base_url))?.with_query(&pairs)
            }
        };
        Ok(request.url.to_string())
    }

    async fn get(&self, url: &str) -> Result<String> {
        let request = HttpRequest::GET(url)?.with_header("Referer", format!("{}/", self.base_url));
        let response = self
            .transport
            .execute(request)
            .await
            .with_context(|| format!("{}: request to {} failed", self.name, url))?
            .error_for_status()?;
        Ok(response.body)
    }

    /// GET page one and remember its component for later pages
    async fn first_page(&self, url: &str) -> Result<String> {
        let html = self.get(url).await?;
        match LivewireSession::from_page(
            self.transport.clone(),
            &self.base_url,
            url,
            &html,
            self.component.as_deref(),
        ) {
            Ok(session) => {
                self.sessions
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(url.to_string(), session);
            }
            Err(e) => warn!("[{}] no livewire session for {}: {:#}", self.name, url, e),
        }
        Ok(html)
    }

    async fn listing(&self, listing: Listing, page: u32, filters: &FilterList) -> Result<AnimesPage> {
        let url = self.listing_url(&listing, filters)?;
        if page <= 1 {
            let html = self.first_page(&url).await?;
            return Ok(self.parse_listing(&html));
        }

        let cached = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&url);
        let mut session = match cached {
            Some(session) => session,
            None => {
                debug!("[{}] no cached session for {:?} at {}, loading page one", self.name, listing, url);
                self.first_page(&url).await?;
                let fresh = self
                    .sessions
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&url);
                fresh.ok_or_else(|| SourceError::Livewire(format!("{url} has no paginated component")))?
            }
        };

        match session.version() {
            LivewireVersion::V3 => session.call("gotoPage", vec![json!(page), json!("page")]),
            LivewireVersion::V2 => session.set("page", page),
        };
        let html = session.commit().await?;
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url, session);
        Ok(self.parse_listing(&html))
    }

    fn parse_listing(&self, html: &str) -> AnimesPage {
        let doc = Html::parse_document(html);
        let mut animes: Vec<Anime> = Vec::new();
        for card in doc.select(&selector(".anime-card, .anime-item, article.anime")) {
            let Some(href) = card
                .select(&selector("a[href]"))
                .find_map(|a| a.value().attr("href"))
            else {
                continue;
            };
            let title = select_text(card, ".anime-title, .title, h3, h2")
                .or_else(|| card.select(&selector("img")).next().and_then(|i| i.value().attr("alt").map(str::to_string)))
                .unwrap_or_default();
            if title.is_empty() {
                continue;
            }
            let mut anime = Anime::new(relative_url(&abs_url(&self.base_url, href)), title);
            anime.thumbnail_url = card.select(&selector("img")).next().and_then(image_url);
            animes.push(anime);
        }
        AnimesPage::new(animes, has_next_control(html))
    }

    fn parse_details(&self, html: &str) -> Anime {
        let doc = Html::parse_document(html);
        let mut anime = Anime::new("", doc_text(&doc, "h1").unwrap_or_default());
        anime.thumbnail_url = doc
            .select(&selector(".poster img, img.poster, .cover img"))
            .next()
            .and_then(image_url);
        anime.description = doc
            .select(&selector(".synopsis, .description"))
            .next()
            .map(|el| strip_html(&el.inner_html()))
            .filter(|d| !d.is_empty());
        let genres = select_all_text(doc.root_element(), ".genres a, a[href*='/genre/']");
        if !genres.is_empty() {
            anime.genre = Some(genres.join(", "));
        }
        anime.author = doc_text(&doc, ".studio");
        anime.status = doc_text(&doc, ".status").map(|s| AnimeStatus::parse(&s)).unwrap_or_default();
        anime.initialized = true;
        anime
    }

    fn parse_episodes(&self, html: &str) -> Vec<Episode> {
        let doc = Html::parse_document(html);
        let mut episodes: Vec<Episode> = doc
            .select(&selector(".episode-list a[href], a.episode[href]"))
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                let label = element_text(a);
                let number = select_text(a, ".episode-number")
                    .map(|n| parse_episode_number(&n, -1.0))
                    .unwrap_or_else(|| parse_episode_number(&label, -1.0));
                let name = select_text(a, ".episode-title").unwrap_or_else(|| {
                    if number >= 0.0 {
                        format!("Episode {number}")
                    } else {
                        label.clone()
                    }
                });
                Some(Episode::new(relative_url(&abs_url(&self.base_url, href)), name, number))
            })
            .collect();
        // Newest first
        episodes.sort_by(|a, b| b.episode_number.total_cmp(&a.episode_number));
        episodes
    }

    fn server_links(&self, html: &str) -> Vec<ServerLink> {
        let doc = Html::parse_document(html);
        let mut links: Vec<ServerLink> = doc
            .select(&selector("[data-embed], [data-video]"))
            .filter_map(|el| {
                let url = el.value().attr("data-embed").or_else(|| el.value().attr("data-video"))?;
                Some(ServerLink::new(abs_url(&self.base_url, url), element_text(el)))
            })
            .collect();
        if links.is_empty() {
            links.extend(
                doc.select(&selector("iframe[src]"))
                    .filter_map(|f| f.value().attr("src"))
                    .map(|src| ServerLink::new(abs_url(&self.base_url, src), "Default")),
            );
        }
        links
    }
}

#[async_trait]
impl AnimeSource for LivewireCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn lang(&self) -> &str {
        &self.lang
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn popular(&self, page: u32) -> Result<AnimesPage> {
        self.listing(Listing::Popular, page, &FilterList::default()).await
    }

    async fn latest(&self, page: u32) -> Result<AnimesPage> {
        self.listing(Listing::Latest, page, &FilterList::default()).await
    }

    async fn search(&self, page: u32, query: &str, filters: &FilterList) -> Result<AnimesPage> {
        self.listing(Listing::Search(query.trim().to_string()), page, filters).await
    }

    async fn details(&self, anime: &Anime) -> Result<Anime> {
        let html = self.get(&abs_url(&self.base_url, &anime.url)).await?;
        let mut details = self.parse_details(&html);
        details.url = anime.url.clone();
        if details.title.is_empty() {
            details.title = anime.title.clone();
        }
        if details.thumbnail_url.is_none() {
            details.thumbnail_url = anime.thumbnail_url.clone();
        }
        Ok(details)
    }

    async fn episodes(&self, anime: &Anime) -> Result<Vec<Episode>> {
        let html = self.get(&abs_url(&self.base_url, &anime.url)).await?;
        Ok(self.parse_episodes(&html))
    }

    async fn videos(&self, episode: &Episode) -> Result<Vec<Video>> {
        let page_url = abs_url(&self.base_url, &episode.url);
        let html = self.get(&page_url).await?;
        let links = self.server_links(&html);
        let videos = self
            .extractors
            .resolve_all(links, self.concurrency, Some(page_url.as_str()), |link| format!("{} - ", link.label))
            .await;
        Ok(sort_videos(
            videos,
            &self.prefs.get_string(PREF_QUALITY_KEY, "1080"),
            &self.prefs.get_string(PREF_SERVER_KEY, ""),
        ))
    }

    fn filter_list(&self) -> FilterList {
        FilterList::new(vec![
            Filter::select(
                "Sort",
                options(&[("Default", ""), ("Popular", "popular"), ("Latest", "latest"), ("Title", "title"), ("Rating", "rating")]),
            ),
            Filter::select(
                "Status",
                options(&[("All", ""), ("Ongoing", "ongoing"), ("Completed", "completed"), ("Upcoming", "upcoming")]),
            ),
            Filter::checkbox_group(
                "Genres",
                options(&[
                    ("Action", "action"),
                    ("Comedy", "comedy"),
                    ("Drama", "drama"),
                    ("Fantasy", "fantasy"),
                    ("Romance", "romance"),
                    ("Slice of Life", "slice-of-life"),
                ]),
            ),
        ])
    }

    fn preference_screen(&self) -> Vec<PreferenceDef> {
        vec![
            PreferenceDef::quality("1080"),
            PreferenceDef::server(&["Direct", "Filemoon", "StreamWish", "StreamTape", "VidHide", "Mp4Upload"], ""),
        ]
    }
}
