//! Per-source settings: persisted store, screen definitions, video ordering

pub mod screen;
pub mod store;

pub use screen::{sort_videos, PreferenceDef, PREF_QUALITY_KEY, PREF_SERVER_KEY};
pub use store::PreferenceStore;
