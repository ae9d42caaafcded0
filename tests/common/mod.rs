//! Canned-response transport shared by the integration tests

use anisource::network::{HttpRequest, HttpResponse, Transport};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

struct Route {
    needle: String,
    status: u16,
    body: String,
    once: bool,
}

/// Answers requests from a route table; the first route whose needle occurs
/// in the URL wins. Every request is recorded.
#[derive(Default)]
pub struct FixtureTransport {
    routes: Mutex<Vec<Route>>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

#[allow(dead_code)]
impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, needle: &str, body: impl Into<String>) -> Self {
        self.route_status(needle, 200, body)
    }

    pub fn route_status(self, needle: &str, status: u16, body: impl Into<String>) -> Self {
        self.push(needle, status, body.into(), false)
    }

    /// Answer a single request, then fall through to later routes
    pub fn route_once(self, needle: &str, body: impl Into<String>) -> Self {
        self.push(needle, 200, body.into(), true)
    }

    fn push(self, needle: &str, status: u16, body: String, once: bool) -> Self {
        self.routes.lock().expect("routes lock").push(Route {
            needle: needle.to_string(),
            status,
            body,
            once,
        });
        self
    }

    pub fn requests_matching(&self, needle: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .filter(|r| r.url.as_str().contains(needle))
            .cloned()
            .collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .map(|r| r.url.to_string())
            .collect()
    }

    pub fn last_matching(&self, needle: &str) -> Option<HttpRequest> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .rev()
            .find(|r| r.url.as_str().contains(needle))
            .cloned()
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.to_string();
        self.requests.lock().expect("requests lock").push(request);
        let mut routes = self.routes.lock().expect("routes lock");
        let index = routes
            .iter()
            .position(|r| url.contains(r.needle.as_str()))
            .ok_or_else(|| anyhow!("no fixture for {url}"))?;
        let response = HttpResponse::new(routes[index].status, url, routes[index].body.clone());
        if routes[index].once {
            routes.remove(index);
        }
        Ok(response)
    }
}
