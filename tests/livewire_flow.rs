//! Livewire-driven listings: page one over GET, later pages through the component

mod common;

use anisource::extractors::default_registry;
use anisource::model::{Anime, Episode};
use anisource::network::{RequestBody, Transport};
use anisource::preferences::{PreferenceStore, PREF_QUALITY_KEY, PREF_SERVER_KEY};
use anisource::source::AnimeSource;
use anisource::sources::LivewireCatalog;
use anisource::SourceError;
use common::FixtureTransport;
use serde_json::{json, Value};
use std::sync::Arc;

const TOKEN: &str = "csrf-abc123";

fn attr_json(value: &Value) -> String {
    value.to_string().replace('&', "&amp;").replace('"', "&quot;")
}

fn snapshot(page: u32, checksum: &str) -> Value {
    json!({
        "data": {"page": page, "sort": "popular", "paginators": [{"page": page}, {"s": "arr"}]},
        "memo": {"id": "Xk2p", "name": "anime-list", "path": "anime", "method": "GET"},
        "checksum": checksum,
    })
}

fn cards(titles: &[(&str, &str)]) -> String {
    titles
        .iter()
        .map(|(slug, title)| {
            format!(
                r#"<div class="anime-card"><a href="/anime/{slug}"><img src="https://lw.example/img/{slug}.jpg" alt="{title}"></a><h3 class="anime-title">{title}</h3></div>"#
            )
        })
        .collect()
}

fn v3_page() -> String {
    format!(
        r#"<html><head><meta name="csrf-token" content="{TOKEN}"></head><body>
        <div wire:snapshot="{}" wire:id="Xk2p">
          {}
          <button wire:click="nextPage('page')">Next</button>
        </div>
        <script src="/livewire/livewire.js" data-csrf="{TOKEN}"></script>
        </body></html>"#,
        attr_json(&snapshot(1, "c1")),
        cards(&[("frieren", "Frieren"), ("mushishi", "Mushishi")]),
    )
}

fn v3_update(page: u32, checksum: &str, html: Option<String>) -> String {
    let mut component = json!({"snapshot": snapshot(page, checksum).to_string(), "effects": {"dirty": ["page"]}});
    if let Some(html) = html {
        component["effects"]["html"] = Value::String(html);
    }
    json!({"components": [component], "assets": []}).to_string()
}

fn catalog(transport: Arc<FixtureTransport>, component: Option<&str>) -> LivewireCatalog {
    let transport: Arc<dyn Transport> = transport;
    LivewireCatalog::new(
        "Livewire",
        "https://lw.example",
        "en",
        component.map(str::to_string),
        transport.clone(),
        Arc::new(default_registry(transport)),
        Arc::new(PreferenceStore::in_memory()),
    )
}

fn json_body(request: &anisource::network::HttpRequest) -> Value {
    match &request.body {
        Some(RequestBody::Json(value)) => value.clone(),
        other => panic!("expected JSON body, got {other:?}"),
    }
}

#[tokio::test]
async fn v3_pages_go_through_goto_page() {
    let page_two = format!("<div>{}</div>", cards(&[("dungeon-meshi", "Dungeon Meshi")]));
    let transport = Arc::new(
        FixtureTransport::new()
            .route("lw.example/anime?sort=popular", v3_page())
            .route_once("/livewire/update", v3_update(2, "c2", Some(page_two)))
            .route_once("/livewire/update", v3_update(3, "c3", None)),
    );
    let catalog = catalog(transport.clone(), None);

    let first = catalog.popular(1).await.expect("page 1");
    assert_eq!(first.animes.len(), 2);
    assert_eq!(first.animes[0].url, "/anime/frieren");
    assert_eq!(first.animes[1].thumbnail_url.as_deref(), Some("https://lw.example/img/mushishi.jpg"));
    assert!(first.has_next_page);

    let second = catalog.popular(2).await.expect("page 2");
    assert_eq!(second.animes.len(), 1);
    assert_eq!(second.animes[0].title, "Dungeon Meshi");
    assert!(!second.has_next_page);

    let updates = transport.requests_matching("/livewire/update");
    let request = &updates[0];
    assert_eq!(request.headers.get("X-CSRF-TOKEN").map(String::as_str), Some(TOKEN));
    assert_eq!(request.headers.get("X-Livewire").map(String::as_str), Some("true"));
    assert_eq!(
        request.headers.get("Referer").map(String::as_str),
        Some("https://lw.example/anime?sort=popular")
    );
    let body = json_body(request);
    assert_eq!(body["_token"], TOKEN);
    let sent: Value = serde_json::from_str(body["components"][0]["snapshot"].as_str().expect("raw snapshot"))
        .expect("snapshot json");
    assert_eq!(sent["checksum"], "c1");
    assert_eq!(body["components"][0]["calls"][0]["method"], "gotoPage");
    assert_eq!(body["components"][0]["calls"][0]["params"], json!([2, "page"]));

    // No html in the effects: the previous render stands
    let third = catalog.popular(3).await.expect("page 3");
    assert_eq!(third.animes[0].title, "Dungeon Meshi");
    let body = json_body(&transport.requests_matching("/livewire/update")[1]);
    let sent: Value = serde_json::from_str(body["components"][0]["snapshot"].as_str().expect("raw snapshot"))
        .expect("snapshot json");
    assert_eq!(sent["checksum"], "c2");
    assert_eq!(body["components"][0]["calls"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn later_page_without_session_loads_page_one_first() {
    let page_two = format!("<div>{}</div>", cards(&[("dungeon-meshi", "Dungeon Meshi")]));
    let transport = Arc::new(
        FixtureTransport::new()
            .route("lw.example/anime?sort=latest", v3_page())
            .route("/livewire/update", v3_update(2, "c2", Some(page_two))),
    );
    let catalog = catalog(transport.clone(), Some("anime-list"));

    let page = catalog.latest(2).await.expect("page 2");
    assert_eq!(page.animes[0].title, "Dungeon Meshi");
    let urls = transport.urls();
    assert_eq!(urls.len(), 2);
    assert!(urls[0].contains("sort=latest"));
    assert!(urls[1].ends_with("/livewire/update"));
}

#[tokio::test]
async fn v2_search_syncs_the_page_property() {
    let initial = json!({
        "fingerprint": {"id": "q9", "name": "anime-search", "locale": "en", "path": "anime", "method": "GET"},
        "serverMemo": {"children": [], "data": {"search": "frieren", "page": 1}, "dataMeta": [], "checksum": "m1"},
    });
    let page = format!(
        r#"<html><head><meta name="csrf-token" content="{TOKEN}"></head><body>
        <div wire:id="q9" wire:initial-data="{}">{}<a href="?page=2" rel="next">Next</a></div>
        </body></html>"#,
        attr_json(&initial),
        cards(&[("frieren", "Frieren")]),
    );
    let reply = json!({
        "effects": {"html": format!("<div>{}</div>", cards(&[("frieren-2", "Frieren Season 2")])), "dirty": ["page"]},
        "serverMemo": {"data": {"page": 2}, "checksum": "m2"},
    });
    let transport = Arc::new(
        FixtureTransport::new()
            .route("lw.example/anime?search=frieren", page)
            .route("/livewire/message/anime-search", reply.to_string()),
    );
    let catalog = catalog(transport.clone(), None);
    let filters = catalog.filter_list();

    let first = catalog.search(1, "frieren", &filters).await.expect("page 1");
    assert!(first.has_next_page);
    let second = catalog.search(2, "frieren", &filters).await.expect("page 2");
    assert_eq!(second.animes[0].title, "Frieren Season 2");
    catalog.search(3, "frieren", &filters).await.expect("page 3");

    let messages = transport.requests_matching("/livewire/message/anime-search");
    let body = json_body(&messages[0]);
    assert_eq!(body["fingerprint"]["name"], "anime-search");
    assert_eq!(body["updates"][0]["type"], "syncInput");
    assert_eq!(body["updates"][0]["payload"]["name"], "page");
    assert_eq!(body["updates"][0]["payload"]["value"], 2);

    // The memo diff from page two is merged into what page three sends
    let body = json_body(&messages[1]);
    assert_eq!(body["serverMemo"]["checksum"], "m2");
    assert_eq!(body["serverMemo"]["data"]["page"], 2);
    assert_eq!(body["serverMemo"]["data"]["search"], "frieren");
}

#[tokio::test]
async fn search_sessions_follow_the_filters() {
    let page_two = format!("<div>{}</div>", cards(&[("mushishi-2", "Mushishi Zoku Shou")]));
    let transport = Arc::new(
        FixtureTransport::new()
            .route("search=x&status=ongoing", v3_page())
            .route("search=x&status=completed", v3_page())
            .route("/livewire/update", v3_update(2, "c2", Some(page_two))),
    );
    let catalog = catalog(transport.clone(), None);

    let mut ongoing = catalog.filter_list();
    assert!(ongoing.apply_assignments(&["Status=ongoing".to_string()]).is_empty());
    let mut completed = catalog.filter_list();
    assert!(completed.apply_assignments(&["Status=completed".to_string()]).is_empty());

    catalog.search(1, "x", &ongoing).await.expect("ongoing page 1");
    let page = catalog.search(2, "x", &completed).await.expect("completed page 2");
    assert_eq!(page.animes[0].title, "Mushishi Zoku Shou");

    let urls = transport.urls();
    assert_eq!(urls.len(), 3);
    assert!(urls[0].ends_with("search=x&status=ongoing"));
    assert!(urls[1].ends_with("search=x&status=completed"));
    let update = transport.last_matching("/livewire/update").expect("update request");
    assert_eq!(
        update.headers.get("Referer").map(String::as_str),
        Some("https://lw.example/anime?search=x&status=completed")
    );
}

#[tokio::test]
async fn settings_offer_every_sort_key() {
    let catalog = catalog(Arc::new(FixtureTransport::new()), None);
    let keys: Vec<_> = catalog.preference_screen().iter().map(|p| p.key().to_string()).collect();
    assert_eq!(keys, vec![PREF_QUALITY_KEY, PREF_SERVER_KEY]);
}

#[tokio::test]
async fn pagination_needs_a_component() {
    let transport = Arc::new(FixtureTransport::new().route(
        "lw.example/anime?sort=popular",
        format!("<html><body>{}</body></html>", cards(&[("frieren", "Frieren")])),
    ));
    let catalog = catalog(transport, None);

    assert_eq!(catalog.popular(1).await.expect("page 1").animes.len(), 1);
    let err = catalog.popular(2).await.expect_err("no component to paginate");
    assert!(matches!(err.downcast_ref::<SourceError>(), Some(SourceError::Livewire(_))));
}

#[tokio::test]
async fn episodes_and_embeds() {
    let show = r#"<html><body>
        <h1>Frieren</h1>
        <div class="episode-list">
          <a href="/watch/frieren/1"><span class="episode-number">1</span></a>
          <a href="/watch/frieren/3"><span class="episode-number">3</span><span class="episode-title">The Soul Lands</span></a>
          <a href="/watch/frieren/2"><span class="episode-number">2</span></a>
        </div></body></html>"#;
    let watch = r#"<html><body><ul class="servers">
        <li data-embed="https://cdn.lw.example/ep1.mp4">Direct HD</li>
        <li data-embed="https://streamtape.com/e/q1">Tape</li>
        </ul></body></html>"#;
    let tape = r#"<script>document.getElementById('robotlink').innerHTML = '//streamtape.com/get_video?id=q1&token=' + ('xyztok').substring(3);</script>"#;
    let transport = Arc::new(
        FixtureTransport::new()
            .route("lw.example/anime/frieren", show)
            .route("lw.example/watch/frieren/1", watch)
            .route("streamtape.com/e/q1", tape),
    );
    let catalog = catalog(transport, None);

    let episodes = catalog
        .episodes(&Anime::new("/anime/frieren", "Frieren"))
        .await
        .expect("episodes");
    let numbers: Vec<f32> = episodes.iter().map(|e| e.episode_number).collect();
    assert_eq!(numbers, vec![3.0, 2.0, 1.0]);
    assert_eq!(episodes[0].name, "The Soul Lands");
    assert_eq!(episodes[2].name, "Episode 1");

    let videos = catalog
        .videos(&Episode::new("/watch/frieren/1", "Episode 1", 1.0))
        .await
        .expect("videos");
    let labels: Vec<_> = videos.iter().map(|v| v.quality.as_str()).collect();
    assert_eq!(labels, vec!["Direct HD - Direct", "Tape - StreamTape"]);
    assert_eq!(
        videos[0].headers.get("Referer").map(String::as_str),
        Some("https://lw.example/watch/frieren/1")
    );
    assert_eq!(videos[1].video_url, "https://streamtape.com/get_video?id=q1&token=tok");
}
