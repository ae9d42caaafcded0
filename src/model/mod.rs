//! Host content types populated by every source

pub mod anime;
pub mod filter;
pub mod video;

pub use anime::{Anime, AnimeStatus, AnimesPage, Episode};
pub use filter::{Filter, FilterList, SortSelection, TriState};
pub use video::{Track, Video};
