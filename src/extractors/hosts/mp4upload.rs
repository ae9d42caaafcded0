use crate::extractors::hosts::fetch_page;
use crate::extractors::sniffer::HostKind;
use crate::extractors::traits::VideoExtractor;
use crate::extractors::unpacker;
use crate::model::Video;
use crate::network::Transport;
use crate::utils::error::SourceError;
use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

lazy_static! {
    static ref PLAYER_SRC: Regex =
        Regex::new(r#"(?:player\.src\(\s*\{[^}]*?src|src)\s*:\s*"([^"]+\.mp4[^"]*)""#).unwrap();
    static ref HEIGHT: Regex = Regex::new(r"(?i)\bHEIGHT=(\d+)|embed=\d+x(\d+)|(\d{3,4})p\b").unwrap();
}

pub fn mp4_url(html: &str) -> Option<String> {
    let script = unpacker::find_packed(html)
        .and_then(unpacker::unpack)
        .unwrap_or_else(|| html.to_string());
    PLAYER_SRC.captures(&script).map(|c| c[1].to_string())
}

fn quality(html: &str) -> String {
    HEIGHT
        .captures(html)
        .and_then(|c| c.iter().skip(1).flatten().next().map(|m| format!("{}p", m.as_str())))
        .unwrap_or_else(|| "Default".to_string())
}

pub struct Mp4UploadExtractor {
    transport: Arc<dyn Transport>,
}

impl Mp4UploadExtractor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl VideoExtractor for Mp4UploadExtractor {
    fn id(&self) -> &'static str {
        "mp4upload"
    }

    fn hosts(&self) -> &'static [HostKind] {
        &[HostKind::Mp4Upload]
    }

    async fn videos_from_url(&self, url: &str, prefix: &str, referer: Option<&str>) -> Result<Vec<Video>> {
        let page = fetch_page(self.transport.as_ref(), url, referer).await?;
        let stream = mp4_url(page.text()).ok_or_else(|| SourceError::parse("mp4upload: no source"))?;
        let label = format!("{prefix}Mp4Upload - {}", quality(page.text()));
        Ok(vec![Video::new(url, label, stream).with_header("Referer", "https://www.mp4upload.com/")])
    }
}
