//! Utility modules for error handling, configuration and text munging

pub mod config;
pub mod error;
pub mod text;

// Re-export for convenience
pub use config::{AppSettings, NetworkSettings, SiteConfig, SiteKind};
pub use error::SourceError;
