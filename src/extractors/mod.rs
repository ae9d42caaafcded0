//! Video host extractors and the registry that routes embeds to them

pub mod hosts;
pub mod playlist;
pub mod registry;
pub mod sniffer;
pub mod traits;
pub mod unpacker;

pub use playlist::PlaylistUtils;
pub use registry::{ExtractorRegistry, ServerLink};
pub use sniffer::{sniff, sniff_server, HostKind};
pub use traits::VideoExtractor;

use crate::network::Transport;
use hosts::{DirectExtractor, Mp4UploadExtractor, PackedPlayerExtractor, StreamTapeExtractor};
use std::sync::Arc;

/// Registry with every bundled extractor, `direct` as fallback
pub fn default_registry(transport: Arc<dyn Transport>) -> ExtractorRegistry {
    let playlists = PlaylistUtils::new(transport.clone());
    let extractors: Vec<Arc<dyn VideoExtractor>> = vec![
        Arc::new(PackedPlayerExtractor::filemoon(transport.clone(), playlists.clone())),
        Arc::new(PackedPlayerExtractor::streamwish(transport.clone(), playlists.clone())),
        Arc::new(PackedPlayerExtractor::vidhide(transport.clone(), playlists.clone())),
        Arc::new(StreamTapeExtractor::new(transport.clone())),
        Arc::new(Mp4UploadExtractor::new(transport)),
    ];
    ExtractorRegistry::new(extractors, Arc::new(DirectExtractor::new(playlists)))
}
