//! anisource library

pub mod anilist;
pub mod extractors;
pub mod livewire;
pub mod model;
pub mod network;
pub mod preferences;
pub mod signing;
pub mod source;
pub mod sources;
pub mod utils;

// Re-export main types for easier use
pub use anilist::{AniListAnimeHttpSource, AniListProvider};
pub use extractors::{default_registry, ExtractorRegistry, HostKind, VideoExtractor};
pub use model::{Anime, AnimeStatus, AnimesPage, Episode, Filter, FilterList, Track, Video};
pub use network::{NetworkClient, Transport};
pub use source::{AnimeSource, CatalogScraper, ScraperSource, SourceRegistry};
pub use utils::{AppSettings, SourceError};
