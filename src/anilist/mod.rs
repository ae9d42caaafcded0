//! Reusable AniList-backed catalog
//!
//! Listings, search and details come from the public AniList GraphQL API;
//! a site-specific [`AniListProvider`] supplies episodes and videos keyed by
//! AniList id.

pub mod dto;
pub mod filters;
pub mod queries;
pub mod source;

pub use dto::{Media, PageInfo};
pub use source::{AniListAnimeHttpSource, AniListProvider, ANILIST_ENDPOINT, PREF_TITLE_KEY};
