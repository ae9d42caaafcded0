use crate::livewire::snapshot::{
    csrf_token, deep_merge, find_components, parse_snapshot, Component, LivewireVersion,
};
use crate::network::{HttpRequest, RequestBody, Transport};
use crate::utils::error::SourceError;
use anyhow::{Context, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

/// One Livewire component driven from outside the browser
///
/// Property updates and method calls are queued with [`set`](Self::set) and
/// [`call`](Self::call) and sent together by [`commit`](Self::commit), which
/// returns the re-rendered component markup.
pub struct LivewireSession {
    transport: Arc<dyn Transport>,
    base_url: String,
    /// Page the component was rendered on, sent as Referer
    page_url: String,
    csrf: String,
    component: Component,
    updates: Map<String, Value>,
    calls: Vec<(String, Vec<Value>)>,
    html: String,
}

impl std::fmt::Debug for LivewireSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivewireSession")
            .field("component", &self.component.name())
            .field("version", &self.component.version())
            .field("pending_updates", &self.updates.len())
            .field("pending_calls", &self.calls.len())
            .finish()
    }
}

fn update_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

impl LivewireSession {
    /// Pick up a component from a rendered page
    ///
    /// With `name` the matching component is used, otherwise the first one.
    pub fn from_page(
        transport: Arc<dyn Transport>,
        base_url: &str,
        page_url: &str,
        html: &str,
        name: Option<&str>,
    ) -> Result<Self> {
        let components = find_components(html);
        let component = match name {
            Some(name) => components.into_iter().find(|c| c.name() == name).ok_or_else(|| {
                SourceError::Livewire(format!("component {name} not found on {page_url}"))
            })?,
            None => components
                .into_iter()
                .next()
                .ok_or_else(|| SourceError::Livewire(format!("no component snapshot on {page_url}")))?,
        };
        let csrf = csrf_token(html)
            .ok_or_else(|| SourceError::Livewire(format!("no CSRF token on {page_url}")))?;
        debug!("Livewire {:?} component {} on {}", component.version(), component.name(), page_url);

        Ok(Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_url: page_url.to_string(),
            csrf,
            component,
            updates: Map::new(),
            calls: Vec::new(),
            html: html.to_string(),
        })
    }

    pub fn version(&self) -> LivewireVersion {
        self.component.version()
    }

    pub fn name(&self) -> &str {
        self.component.name()
    }

    /// Current public properties
    pub fn data(&self) -> &Value {
        self.component.data()
    }

    /// Markup of the last render
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> &mut Self {
        self.updates.insert(property.to_string(), value.into());
        self
    }

    pub fn call(&mut self, method: &str, params: Vec<Value>) -> &mut Self {
        self.calls.push((method.to_string(), params));
        self
    }

    /// Request for the queued updates and calls, without sending it
    pub fn build_request(&self) -> Result<HttpRequest> {
        let (url, body) = match &self.component {
            Component::V3 { raw, .. } => {
                let calls: Vec<Value> = self
                    .calls
                    .iter()
                    .map(|(method, params)| json!({"path": "", "method": method, "params": params}))
                    .collect();
                let body = json!({
                    "_token": self.csrf,
                    "components": [{
                        "snapshot": raw,
                        "updates": self.updates,
                        "calls": calls,
                    }],
                });
                (format!("{}/livewire/update", self.base_url), body)
            }
            Component::V2 {
                fingerprint,
                server_memo,
            } => {
                let mut updates: Vec<Value> = self
                    .updates
                    .iter()
                    .map(|(name, value)| {
                        json!({"type": "syncInput", "payload": {"id": update_id(), "name": name, "value": value}})
                    })
                    .collect();
                updates.extend(self.calls.iter().map(|(method, params)| {
                    json!({"type": "callMethod", "payload": {"id": update_id(), "method": method, "params": params}})
                }));
                let body = json!({
                    "fingerprint": fingerprint,
                    "serverMemo": server_memo,
                    "updates": updates,
                });
                (format!("{}/livewire/message/{}", self.base_url, self.name()), body)
            }
        };

        let request = HttpRequest::POST(&url, RequestBody::Json(body))?
            .with_header("X-Livewire", "true")
            .with_header("X-CSRF-TOKEN", self.csrf.clone())
            .with_header("Accept", "application/json")
            .with_header("Referer", self.page_url.clone());
        Ok(request)
    }

    /// Send queued updates and calls; returns the new markup
    pub async fn commit(&mut self) -> Result<String> {
        let request = self.build_request()?;
        let url = request.url.to_string();
        let response = self
            .transport
            .execute(request)
            .await
            .with_context(|| format!("Livewire update to {url} failed"))?
            .error_for_status()?;
        let mut payload: Value = response.parse_as()?;

        let html = match &mut self.component {
            Component::V3 { raw, snapshot } => {
                let entry = payload
                    .pointer_mut("/components/0")
                    .map(Value::take)
                    .ok_or_else(|| SourceError::Livewire("update response has no components".into()))?;
                let new_raw = entry
                    .get("snapshot")
                    .and_then(Value::as_str)
                    .ok_or_else(|| SourceError::Livewire("update response has no snapshot".into()))?;
                let next = parse_snapshot(new_raw)?;
                let old_name = snapshot.pointer("/memo/name").cloned();
                if next.pointer("/memo/name").cloned() != old_name {
                    return Err(SourceError::Livewire(format!(
                        "component name changed from {:?} to {:?}",
                        old_name,
                        next.pointer("/memo/name")
                    ))
                    .into());
                }
                *raw = new_raw.to_string();
                *snapshot = next;
                entry.pointer("/effects/html").and_then(Value::as_str).map(str::to_string)
            }
            Component::V2 { server_memo, .. } => {
                if let Some(diff) = payload.get_mut("serverMemo").map(Value::take) {
                    deep_merge(server_memo, diff);
                }
                payload.pointer("/effects/html").and_then(Value::as_str).map(str::to_string)
            }
        };

        self.updates.clear();
        self.calls.clear();
        if let Some(html) = html {
            self.html = html;
        }
        Ok(self.html.clone())
    }
}
