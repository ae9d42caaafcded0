//! Locating component state and CSRF tokens in rendered pages

use crate::network::document::selector;
use crate::utils::error::SourceError;
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;
use serde_json::Value;

lazy_static! {
    static ref TOKEN_SCRIPT: Regex =
        Regex::new(r#"livewire_token\s*=\s*['"]([^'"]+)['"]"#).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivewireVersion {
    V2,
    V3,
}

/// Component state as rendered into the page
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// `wire:snapshot`; `raw` is sent back verbatim, the checksum covers it
    V3 { raw: String, snapshot: Value },
    /// `wire:initial-data`
    V2 { fingerprint: Value, server_memo: Value },
}

impl Component {
    pub fn version(&self) -> LivewireVersion {
        match self {
            Component::V3 { .. } => LivewireVersion::V3,
            Component::V2 { .. } => LivewireVersion::V2,
        }
    }

    pub fn name(&self) -> &str {
        let name = match self {
            Component::V3 { snapshot, .. } => snapshot.pointer("/memo/name"),
            Component::V2 { fingerprint, .. } => fingerprint.get("name"),
        };
        name.and_then(Value::as_str).unwrap_or("")
    }

    /// Public properties
    pub fn data(&self) -> &Value {
        let data = match self {
            Component::V3 { snapshot, .. } => snapshot.get("data"),
            Component::V2 { server_memo, .. } => server_memo.get("data"),
        };
        data.unwrap_or(&Value::Null)
    }

    pub fn parse_v3(raw: &str) -> Result<Self> {
        Ok(Component::V3 {
            raw: raw.to_string(),
            snapshot: parse_snapshot(raw)?,
        })
    }

    pub fn parse_v2(initial_data: &str) -> Result<Self> {
        let mut data: Value = serde_json::from_str(initial_data).map_err(SourceError::from)?;
        let (Some(fingerprint), Some(server_memo)) = (
            data.get_mut("fingerprint").map(Value::take),
            data.get_mut("serverMemo").map(Value::take),
        ) else {
            return Err(SourceError::Livewire("initial data without fingerprint".into()).into());
        };
        Ok(Component::V2 {
            fingerprint,
            server_memo,
        })
    }
}

/// Decode a v3 snapshot; it must at least carry a `memo`
pub fn parse_snapshot(raw: &str) -> Result<Value> {
    let snapshot: Value = serde_json::from_str(raw).map_err(SourceError::from)?;
    if !snapshot.get("memo").is_some_and(Value::is_object) {
        return Err(SourceError::Livewire("snapshot without memo".into()).into());
    }
    Ok(snapshot)
}

/// Every component on a page, in document order
pub fn find_components(html: &str) -> Vec<Component> {
    let doc = Html::parse_document(html);
    let all = selector("*");
    doc.select(&all)
        .filter_map(|el| {
            let attrs = el.value();
            if let Some(raw) = attrs.attr("wire:snapshot") {
                Component::parse_v3(raw).ok()
            } else {
                attrs
                    .attr("wire:initial-data")
                    .and_then(|raw| Component::parse_v2(raw).ok())
            }
        })
        .collect()
}

/// CSRF token from the livewire script tag, the meta tag or an inline assignment
pub fn csrf_token(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let from_attr = |css: &str, attr: &str| {
        doc.select(&selector(css))
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    };
    from_attr("script[data-csrf]", "data-csrf")
        .or_else(|| from_attr("meta[name=csrf-token]", "content"))
        .or_else(|| TOKEN_SCRIPT.captures(html).map(|c| c[1].to_string()))
}

/// Merge a v2 memo diff: objects key-wise, anything else replaces
pub fn deep_merge(target: &mut Value, diff: Value) {
    match (target, diff) {
        (Value::Object(target), Value::Object(diff)) => {
            for (key, value) in diff {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, diff) => *target = diff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn escape(json: &Value) -> String {
        json.to_string().replace('"', "&quot;")
    }

    #[test]
    fn test_find_v3_component_and_csrf() {
        let snapshot = json!({
            "data": {"search": "", "paginators": [{"page": 1}, {"s": "arr"}]},
            "memo": {"id": "Xy12", "name": "anime-list", "path": "anime"},
            "checksum": "abc"
        });
        let html = format!(
            r#"<html><head><meta name="csrf-token" content="meta-token"></head><body>
            <div wire:snapshot="{}" wire:id="Xy12"><a href="/anime/1">One</a></div>
            <script src="/livewire/livewire.js" data-csrf="script-token"></script></body></html>"#,
            escape(&snapshot)
        );
        let components = find_components(&html);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].version(), LivewireVersion::V3);
        assert_eq!(components[0].name(), "anime-list");
        assert_eq!(components[0].data()["paginators"][0]["page"], 1);
        assert_eq!(csrf_token(&html).as_deref(), Some("script-token"));
    }

    #[test]
    fn test_find_v2_component() {
        let initial = json!({
            "fingerprint": {"id": "a1", "name": "browse", "method": "GET", "path": "browse"},
            "effects": {"listeners": []},
            "serverMemo": {"data": {"page": 1, "sort": "popular"}, "checksum": "c1"}
        });
        let html = format!(
            r#"<div wire:id="a1" wire:initial-data="{}"></div><script>window.livewire_token = 'inline-token';</script>"#,
            escape(&initial)
        );
        let components = find_components(&html);
        assert_eq!(components[0].version(), LivewireVersion::V2);
        assert_eq!(components[0].name(), "browse");
        assert_eq!(components[0].data()["sort"], "popular");
        assert_eq!(csrf_token(&html).as_deref(), Some("inline-token"));
    }

    #[test]
    fn test_broken_state_skipped() {
        assert!(find_components(r#"<div wire:snapshot="{not json"></div>"#).is_empty());
        assert!(find_components(r#"<div wire:snapshot="{&quot;data&quot;:{}}"></div>"#).is_empty());
        assert!(csrf_token("<html></html>").is_none());
    }

    #[test]
    fn test_deep_merge() {
        let mut memo = json!({"data": {"page": 1, "items": [1, 2], "filters": {"genre": "a", "year": 2020}}, "checksum": "old"});
        deep_merge(&mut memo, json!({"data": {"page": 2, "items": [3], "filters": {"year": null}}, "checksum": "new", "htmlHash": "h"}));
        assert_eq!(
            memo,
            json!({"data": {"page": 2, "items": [3], "filters": {"genre": "a", "year": null}}, "checksum": "new", "htmlHash": "h"})
        );
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,4}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(Value::from),
                prop::collection::btree_map("[a-c]", inner, 0..3)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_merge_is_idempotent(base in arb_json(), diff in arb_json()) {
            let mut once = base.clone();
            deep_merge(&mut once, diff.clone());
            let mut twice = once.clone();
            deep_merge(&mut twice, diff);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_merge_with_empty_object_is_identity(base in arb_json()) {
            let mut merged = base.clone();
            deep_merge(&mut merged, Value::Object(Default::default()));
            if base.is_object() {
                prop_assert_eq!(merged, base);
            }
        }
    }
}
