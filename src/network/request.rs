//! Transport-agnostic request and response values

use crate::utils::error::SourceError;
use anyhow::Result;
use scraper::Html;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Raw { content_type: String, data: String },
}

/// An outbound request built by a source
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    #[allow(non_snake_case)]
    pub fn GET(url: &str) -> Result<Self> {
        Ok(Self {
            method: Method::Get,
            url: parse_url(url)?,
            headers: BTreeMap::new(),
            body: None,
        })
    }

    #[allow(non_snake_case)]
    pub fn POST(url: &str, body: RequestBody) -> Result<Self> {
        Ok(Self {
            method: Method::Post,
            url: parse_url(url)?,
            headers: BTreeMap::new(),
            body: Some(body),
        })
    }

    /// POST a serializable value as JSON
    pub fn post_json<T: Serialize>(url: &str, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(SourceError::from)?;
        Self::POST(url, RequestBody::Json(value))
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    pub fn with_query(mut self, pairs: &[(&str, &str)]) -> Self {
        {
            let mut query = self.url.query_pairs_mut();
            for (k, v) in pairs {
                query.append_pair(k, v);
            }
        }
        self
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| SourceError::InvalidUrl(format!("{url}: {e}")).into())
}

/// A fully buffered response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL after redirects
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SourceError::Http {
                status: self.status,
                url: self.url,
            }
            .into())
        }
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Deserialize the body as JSON
    pub fn parse_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| SourceError::from(e).into())
    }

    /// Parse the body as an HTML document
    pub fn as_document(&self) -> Html {
        Html::parse_document(&self.body)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
