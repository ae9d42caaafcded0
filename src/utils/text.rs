//! Small text helpers shared by scrapers

use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EPISODE_NUMBER: Regex =
        Regex::new(r"(?i)(?:episode|ep\.?|eps)\s*(\d+(?:\.\d+)?)").unwrap();
    static ref ANY_NUMBER: Regex = Regex::new(r"(\d+(?:\.\d+)?)").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
    static ref BREAK_TAG: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
}

/// Extract an episode number from labels like "Episode 12.5" or "EP 3 - Title"
///
/// Falls back to the first number in the text, then to `default`.
pub fn parse_episode_number(text: &str, default: f32) -> f32 {
    EPISODE_NUMBER
        .captures(text)
        .or_else(|| ANY_NUMBER.captures(text))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .unwrap_or(default)
}

/// Parse a date with the first matching format; returns epoch milliseconds or 0
pub fn parse_date(text: &str, formats: &[&str]) -> i64 {
    let text = text.trim();
    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return dt.and_utc().timestamp_millis();
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return dt.and_utc().timestamp_millis();
            }
        }
    }
    0
}

/// Strip HTML tags, turning `<br>` into newlines and decoding basic entities
pub fn strip_html(html: &str) -> String {
    let with_breaks = BREAK_TAG.replace_all(html, "\n");
    let stripped = HTML_TAG.replace_all(&with_breaks, "");
    decode_entities(&stripped).trim().to_string()
}

/// Decode the handful of entities sites actually emit
pub fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Last non-empty path segment of a URL
pub fn slug_from_url(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .unwrap_or("")
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_string()
}
