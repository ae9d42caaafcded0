//! The plugin contract every source implements

pub mod registry;
pub mod scraper;
pub mod traits;

pub use registry::SourceRegistry;
pub use scraper::{CatalogScraper, ScraperSource};
pub use traits::{source_id, AnimeSource};
