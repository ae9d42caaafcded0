//! WordPress sites running the "AnimeStream" theme
//!
//! One scraper serves every site on the theme; only the base URL, language
//! and optional embed passphrase differ.

use crate::extractors::{ExtractorRegistry, ServerLink};
use crate::model::filter::options;
use crate::model::{Anime, AnimeStatus, AnimesPage, Episode, Filter, FilterList, Video};
use crate::network::document::{doc_text, element_text, image_url, relative_url, select_all_text, select_text, selector};
use crate::network::{HttpRequest, HttpResponse};
use crate::preferences::{sort_videos, PreferenceDef, PreferenceStore, PREF_QUALITY_KEY, PREF_SERVER_KEY};
use crate::signing::cryptojs;
use crate::source::CatalogScraper;
use crate::utils::text::{parse_date, parse_episode_number, strip_html};
use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, warn};

lazy_static! {
    static ref IFRAME_SRC: Regex = Regex::new(r#"(?i)<iframe[^>]*\ssrc\s*=\s*["']([^"']+)["']"#).unwrap();
}

const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%Y-%m-%d", "%d %B %Y"];
const SERVERS: &[&str] = &["Filemoon", "StreamWish", "VidHide", "StreamTape", "Mp4Upload"];

pub struct AnimeStream {
    name: String,
    base_url: String,
    lang: String,
    passphrase: Option<String>,
    extractors: Arc<ExtractorRegistry>,
    prefs: Arc<PreferenceStore>,
    concurrency: usize,
}

impl AnimeStream {
    pub fn new(
        name: &str,
        base_url: &str,
        lang: &str,
        extractors: Arc<ExtractorRegistry>,
        prefs: Arc<PreferenceStore>,
    ) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: lang.to_string(),
            passphrase: None,
            extractors,
            prefs,
            concurrency: 4,
        }
    }

    /// Passphrase for sites that AES-encrypt their mirror options
    pub fn with_passphrase(mut self, passphrase: Option<String>) -> Self {
        self.passphrase = passphrase.filter(|p| !p.is_empty());
        self
    }

    pub fn with_concurrency(mut self, width: usize) -> Self {
        self.concurrency = width.max(1);
        self
    }

    fn listing_url(&self, page: u32, order: &str) -> String {
        format!("{}/anime/?page={}&order={}", self.base_url, page.max(1), order)
    }

    fn parse_listing(&self, response: &HttpResponse) -> AnimesPage {
        let doc = response.as_document();
        let item = selector("div.listupd article.bs, div.listupd article, .listupd .bs");
        let mut animes = Vec::new();
        for el in doc.select(&item) {
            let Some(link) = el.select(&selector("a[href]")).next() else {
                continue;
            };
            let href = link.value().attr("href").unwrap_or_default();
            let title = link
                .value()
                .attr("title")
                .map(str::to_string)
                .or_else(|| select_text(el, ".tt h2, .tt, h2"))
                .unwrap_or_default();
            if href.is_empty() || title.is_empty() {
                continue;
            }
            let mut anime = Anime::new(relative_url(href), title.trim());
            anime.thumbnail_url = el.select(&selector("img")).next().and_then(image_url);
            animes.push(anime);
        }
        let has_next = doc
            .select(&selector("div.hpage a.r, a.next.page-numbers, .pagination .next"))
            .next()
            .is_some();
        AnimesPage::new(animes, has_next)
    }

    /// Embed URL hidden in a mirror `<option value>`
    ///
    /// Values are base64 iframe markup; some sites additionally wrap the
    /// markup in CryptoJS AES, either raw `Salted__` or the `{ct,iv,s}` JSON.
    pub fn decode_mirror(&self, value: &str) -> Option<String> {
        let raw = STANDARD.decode(value.trim()).ok()?;
        let markup = if raw.starts_with(b"Salted__") {
            let passphrase = self.passphrase.as_deref()?;
            cryptojs::decrypt(passphrase, value.trim())
                .map_err(|e| warn!("[{}] mirror decryption failed: {:#}", self.name, e))
                .ok()?
        } else {
            let text = String::from_utf8(raw).ok()?;
            match (self.passphrase.as_deref(), text.trim_start().starts_with('{')) {
                (Some(passphrase), true) => cryptojs::decrypt_json(passphrase, &text)
                    .map_err(|e| warn!("[{}] mirror decryption failed: {:#}", self.name, e))
                    .ok()?,
                _ => text,
            }
        };
        IFRAME_SRC
            .captures(&markup)
            .map(|c| c[1].to_string())
            .or_else(|| markup.trim().starts_with("http").then(|| markup.trim().to_string()))
            .map(|src| crate::network::document::abs_url(&self.base_url, &src))
    }

    fn server_links(&self, html: &str) -> Vec<ServerLink> {
        let doc = Html::parse_document(html);
        let mut links: Vec<ServerLink> = doc
            .select(&selector("select.mirror option"))
            .filter_map(|option| {
                let value = option.value().attr("value")?;
                if value.trim().is_empty() {
                    return None;
                }
                let url = self.decode_mirror(value)?;
                Some(ServerLink::new(url, element_text(option)))
            })
            .collect();
        if links.is_empty() {
            if let Some(src) = doc
                .select(&selector("#pembed iframe, .player-embed iframe, .video-content iframe"))
                .find_map(|f| f.value().attr("src"))
            {
                links.push(ServerLink::new(crate::network::document::abs_url(&self.base_url, src), "Default"));
            }
        }
        links
    }
}

#[async_trait]
impl CatalogScraper for AnimeStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn lang(&self) -> &str {
        &self.lang
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn popular_request(&self, page: u32) -> Result<HttpRequest> {
        HttpRequest::GET(&self.listing_url(page, "popular"))
    }

    fn popular_parse(&self, response: &HttpResponse) -> Result<AnimesPage> {
        Ok(self.parse_listing(response))
    }

    fn latest_request(&self, page: u32) -> Result<HttpRequest> {
        HttpRequest::GET(&self.listing_url(page, "update"))
    }

    fn search_request(&self, page: u32, query: &str, filters: &FilterList) -> Result<HttpRequest> {
        let query = query.trim();
        if !query.is_empty() {
            return HttpRequest::GET(&format!(
                "{}/page/{}/?s={}",
                self.base_url,
                page.max(1),
                urlencoding::encode(query)
            ));
        }

        let page_param = page.max(1).to_string();
        let mut pairs: Vec<(&str, &str)> = vec![("page", page_param.as_str())];
        for (param, filter) in [("status", "Status"), ("type", "Type"), ("order", "Order")] {
            if let Some(value) = filters.selected(filter).filter(|v| !v.is_empty()) {
                pairs.push((param, value));
            }
        }
        for genre in filters.checked("Genres") {
            pairs.push(("genre[]", genre));
        }
        Ok(HttpRequest::GET(&format!("{}/anime/", self.base_url))?.with_query(&pairs))
    }

    fn search_parse(&self, response: &HttpResponse) -> Result<AnimesPage> {
        Ok(self.parse_listing(response))
    }

    fn details_parse(&self, response: &HttpResponse) -> Result<Anime> {
        let doc = response.as_document();
        let mut anime = Anime::new(relative_url(&response.url), doc_text(&doc, ".entry-title").unwrap_or_default());
        anime.thumbnail_url = doc.select(&selector(".thumb img")).next().and_then(image_url);
        anime.description = doc
            .select(&selector(".entry-content"))
            .next()
            .map(|el| strip_html(&el.inner_html()))
            .filter(|d| !d.is_empty());
        let genres = select_all_text(doc.root_element(), ".genxed a");
        if !genres.is_empty() {
            anime.genre = Some(genres.join(", "));
        }
        for info in select_all_text(doc.root_element(), ".spe span") {
            let Some((key, value)) = info.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "status" => anime.status = AnimeStatus::parse(value),
                "studio" | "studios" => anime.author = Some(value.to_string()),
                "producers" | "fansub" => anime.artist = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(anime)
    }

    fn episode_list_parse(&self, response: &HttpResponse) -> Result<Vec<Episode>> {
        let doc = response.as_document();
        let episodes = doc
            .select(&selector(".eplister li"))
            .filter_map(|li| {
                let href = li.select(&selector("a[href]")).next()?.value().attr("href")?;
                let number_text = select_text(li, ".epl-num").unwrap_or_default();
                let title = select_text(li, ".epl-title").unwrap_or_default();
                let number = parse_episode_number(&number_text, parse_episode_number(&title, -1.0));
                let name = match (title.is_empty(), number_text.is_empty()) {
                    (false, _) => title,
                    (true, false) => format!("Episode {number_text}"),
                    (true, true) => "Episode".to_string(),
                };
                let mut episode = Episode::new(relative_url(href), name, number);
                episode.date_upload = select_text(li, ".epl-date")
                    .map(|d| parse_date(&d, DATE_FORMATS))
                    .unwrap_or(0);
                episode.scanlator = select_text(li, ".epl-sub .status");
                Some(episode)
            })
            .collect();
        Ok(episodes)
    }

    async fn video_list_parse(&self, response: &HttpResponse) -> Result<Vec<Video>> {
        let links = self.server_links(response.text());
        debug!("[{}] {} mirrors on {}", self.name, links.len(), response.url);
        let referer = format!("{}/", self.base_url);
        Ok(self
            .extractors
            .resolve_all(links, self.concurrency, Some(referer.as_str()), |link| format!("{} - ", link.label))
            .await)
    }

    fn sort_videos(&self, videos: Vec<Video>) -> Vec<Video> {
        sort_videos(
            videos,
            &self.prefs.get_string(PREF_QUALITY_KEY, "1080"),
            &self.prefs.get_string(PREF_SERVER_KEY, SERVERS[0]),
        )
    }

    fn filter_list(&self) -> FilterList {
        FilterList::new(vec![
            Filter::header("Text search ignores filters"),
            Filter::select(
                "Status",
                options(&[("All", ""), ("Ongoing", "ongoing"), ("Completed", "completed"), ("Upcoming", "upcoming"), ("Hiatus", "hiatus")]),
            ),
            Filter::select(
                "Type",
                options(&[("All", ""), ("TV", "tv"), ("Movie", "movie"), ("OVA", "ova"), ("ONA", "ona"), ("Special", "special")]),
            ),
            Filter::select(
                "Order",
                options(&[
                    ("Default", ""),
                    ("A-Z", "title"),
                    ("Z-A", "titlereverse"),
                    ("Latest update", "update"),
                    ("Latest added", "latest"),
                    ("Popular", "popular"),
                ]),
            ),
            Filter::checkbox_group(
                "Genres",
                options(&[
                    ("Action", "action"),
                    ("Adventure", "adventure"),
                    ("Comedy", "comedy"),
                    ("Drama", "drama"),
                    ("Fantasy", "fantasy"),
                    ("Isekai", "isekai"),
                    ("Mystery", "mystery"),
                    ("Romance", "romance"),
                    ("School", "school"),
                    ("Sci-Fi", "sci-fi"),
                    ("Slice of Life", "slice-of-life"),
                    ("Sports", "sports"),
                    ("Supernatural", "supernatural"),
                ]),
            ),
        ])
    }

    fn preference_screen(&self) -> Vec<PreferenceDef> {
        vec![PreferenceDef::quality("1080"), PreferenceDef::server(SERVERS, SERVERS[0])]
    }
}
