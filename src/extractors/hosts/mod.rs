//! Extractors for individual video hosts

pub mod direct;
pub mod mp4upload;
pub mod packed;
pub mod streamtape;

pub use direct::DirectExtractor;
pub use mp4upload::Mp4UploadExtractor;
pub use packed::PackedPlayerExtractor;
pub use streamtape::StreamTapeExtractor;

use crate::network::{HttpRequest, HttpResponse, Transport};
use anyhow::{Context, Result};

/// GET an embed page, optionally with a Referer
pub(crate) async fn fetch_page(
    transport: &dyn Transport,
    url: &str,
    referer: Option<&str>,
) -> Result<HttpResponse> {
    let mut request = HttpRequest::GET(url)?;
    if let Some(r) = referer {
        request = request.with_header("Referer", r);
    }
    transport
        .execute(request)
        .await
        .with_context(|| format!("Failed to fetch embed {url}"))?
        .error_for_status()
}
