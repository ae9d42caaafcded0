//! Tolerant DOM helpers over `scraper`
//!
//! Missing nodes give empty/None values instead of errors.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compile a selector known at build time
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// Trimmed, whitespace-normalized text of the first match
pub fn select_text(root: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css);
    root.select(&sel)
        .next()
        .map(|el| element_text(el))
        .filter(|t| !t.is_empty())
}

/// Same as [`select_text`] starting from the document root
pub fn doc_text(doc: &Html, css: &str) -> Option<String> {
    select_text(doc.root_element(), css)
}

/// Attribute of the first match
pub fn select_attr(root: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    let sel = selector(css);
    root.select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

pub fn doc_attr(doc: &Html, css: &str, attr: &str) -> Option<String> {
    select_attr(doc.root_element(), css, attr)
}

/// Texts of all matches
pub fn select_all_text(root: ElementRef<'_>, css: &str) -> Vec<String> {
    let sel = selector(css);
    root.select(&sel)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Normalized text content of an element
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of direct text-node children only
pub fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Image URL, preferring lazy-load attributes over placeholder `src`
pub fn image_url(el: ElementRef<'_>) -> Option<String> {
    ["data-src", "data-lazy-src", "srcset", "src"]
        .iter()
        .filter_map(|attr| el.value().attr(attr))
        .map(|v| v.split_whitespace().next().unwrap_or("").to_string())
        .find(|v| !v.is_empty() && !v.starts_with("data:"))
}

/// Resolve `href` against `base`; returns `href` unchanged when resolution fails
pub fn abs_url(base: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("//") {
        return format!("https:{href}");
    }
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Path (plus query) of an absolute URL, used to store source-relative URLs
pub fn relative_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(u) => match u.query() {
            Some(q) => format!("{}?{}", u.path(), q),
            None => u.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}
