//! reqwest-backed transport with a shared cookie jar and retry logic

use crate::network::request::{HttpRequest, HttpResponse, Method, RequestBody};
use crate::utils::config::NetworkSettings;
use crate::utils::error::SourceError;
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// User agents rotated through when no fixed agent is configured
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
];

/// Executes requests built by sources
///
/// Sources only ever talk to this trait, so whole request→parse flows can be
/// driven offline with canned responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Cookie header value the jar would send to `url`, if any
    fn cookie_header(&self, _url: &str) -> Option<String> {
        None
    }
}

/// Production transport over reqwest
pub struct NetworkClient {
    client: Client,
    jar: Arc<Jar>,
    settings: NetworkSettings,
}

impl NetworkClient {
    pub fn new() -> Result<Self> {
        Self::with_settings(NetworkSettings::default())
    }

    pub fn with_settings(settings: NetworkSettings) -> Result<Self> {
        let jar = Arc::new(Jar::default());

        let mut headers = HeaderMap::new();
        headers.insert(
            "Accept",
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert("Accept-Language", HeaderValue::from_static("en-US,en;q=0.9"));

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .cookie_provider(jar.clone())
            .gzip(true)
            .brotli(true)
            .default_headers(headers)
            .build()
            .map_err(SourceError::from)?;

        Ok(Self {
            client,
            jar,
            settings,
        })
    }

    fn user_agent(&self) -> &str {
        match &self.settings.user_agent {
            Some(ua) => ua,
            None => {
                let index = rand::thread_rng().gen_range(0..USER_AGENTS.len());
                USER_AGENTS[index]
            }
        }
    }

    /// Exponential backoff with ±25% jitter, capped
    fn retry_delay(&self, attempt: usize) -> Duration {
        let base = self.settings.initial_retry_delay_ms;
        let delay_ms = base
            .saturating_mul(2u64.saturating_pow(attempt as u32))
            .min(self.settings.max_retry_delay_ms);
        let jitter = rand::thread_rng().gen_range(0.75..=1.25);
        Duration::from_millis((delay_ms as f64 * jitter) as u64)
    }

    /// Rate limiting, server errors and Cloudflare origin errors
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504 | 520..=527)
    }

    fn build(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder> {
        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };

        if !request.headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent")) {
            builder = builder.header("User-Agent", self.user_agent());
        }
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SourceError::parse(format!("bad header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SourceError::parse(format!("bad header value: {e}")))?;
            builder = builder.header(name, value);
        }

        builder = match &request.body {
            None => builder,
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Form(pairs)) => builder.form(pairs),
            Some(RequestBody::Raw { content_type, data }) => builder
                .header("Content-Type", content_type.as_str())
                .body(data.clone()),
        };
        Ok(builder)
    }
}

#[async_trait]
impl Transport for NetworkClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let max_retries = self.settings.max_retries;
        let mut attempt = 0;

        loop {
            debug!("{:?} {} (attempt {})", request.method, request.url, attempt + 1);
            match self.build(&request)?.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if Self::is_retryable_status(status) && attempt < max_retries {
                        warn!(
                            "Received retryable status {} for {}, attempt {}/{}",
                            status,
                            request.url,
                            attempt + 1,
                            max_retries + 1
                        );
                        sleep(self.retry_delay(attempt)).await;
                        attempt += 1;
                        continue;
                    }

                    let url = response.url().to_string();
                    let headers: BTreeMap<String, String> = response
                        .headers()
                        .iter()
                        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
                        .collect();
                    let body = response.text().await.map_err(SourceError::from)?;
                    return Ok(HttpResponse {
                        status,
                        url,
                        headers,
                        body,
                    });
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect() || e.is_request();
                    if transient && attempt < max_retries {
                        warn!(
                            "Request failed for {}, attempt {}/{}: {}",
                            request.url,
                            attempt + 1,
                            max_retries + 1,
                            e
                        );
                        sleep(self.retry_delay(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(SourceError::from(e).into());
                }
            }
        }
    }

    fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        self.jar
            .cookies(&url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }
}
