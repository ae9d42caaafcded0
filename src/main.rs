//! anisource - browse anime catalogs from the command line
//!
//! Every command prints pretty JSON on stdout; logs go to stderr.

use anisource::extractors::{self, sniff};
use anisource::model::{Anime, Episode};
use anisource::network::NetworkClient;
use anisource::preferences::PreferenceStore;
use anisource::utils::config::prefs_dir;
use anisource::{AnimeSource, AppSettings, SourceRegistry, Transport};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "anisource", version, about = "Anime catalog sources")]
struct Args {
    /// Config file (defaults to <config_dir>/anisource/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List configured sources
    Sources,
    /// Popular listing
    Popular {
        source: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Latest updates
    Latest {
        source: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search with optional filters (`--filter Genres=action,drama`)
    Search {
        source: String,
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "filter", value_name = "NAME=VALUE")]
        filters: Vec<String>,
    },
    /// Details of one entry
    Details { source: String, url: String },
    /// Episodes of one entry
    Episodes { source: String, url: String },
    /// Resolved videos of one episode
    Videos { source: String, episode_url: String },
    /// Filters a source accepts
    Filters { source: String },
    /// Preference screen and current values, optionally setting `KEY=VALUE`
    Prefs {
        source: String,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Identify video hosts of embed URLs or labels
    Sniff { urls: Vec<String> },
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = match &args.config {
        Some(path) => AppSettings::load_from(path).await?,
        None => AppSettings::load().await?,
    };
    debug!("Settings: {:?}", settings);

    if let Command::Sniff { urls } = &args.command {
        let hosts: Vec<_> = urls
            .iter()
            .map(|u| json!({"input": u, "host": sniff(u).map(|h| h.label())}))
            .collect();
        return print(&hosts);
    }

    let transport: Arc<dyn Transport> = Arc::new(NetworkClient::with_settings(settings.network.clone())?);
    let extractors = Arc::new(extractors::default_registry(transport.clone()));
    let registry = SourceRegistry::from_settings(&settings, transport, extractors).await?;

    match args.command {
        Command::Sources => {
            let sources: Vec<_> = registry
                .all()
                .iter()
                .map(|s| {
                    json!({
                        "id": s.id().to_string(),
                        "name": s.name(),
                        "lang": s.lang(),
                        "base_url": s.base_url(),
                        "supports_latest": s.supports_latest(),
                    })
                })
                .collect();
            print(&sources)
        }
        Command::Popular { source, page } => print(&registry.get(&source)?.popular(page).await?),
        Command::Latest { source, page } => {
            let source = registry.get(&source)?;
            if !source.supports_latest() {
                anyhow::bail!("{} has no latest listing", source.name());
            }
            print(&source.latest(page).await?)
        }
        Command::Search {
            source,
            query,
            page,
            filters,
        } => {
            let source = registry.get(&source)?;
            let mut filter_list = source.filter_list();
            let rejected = filter_list.apply_assignments(&filters);
            if !rejected.is_empty() {
                anyhow::bail!("Unknown filter or value: {}", rejected.join(", "));
            }
            print(&source.search(page, &query, &filter_list).await?)
        }
        Command::Details { source, url } => {
            print(&registry.get(&source)?.details(&Anime::new(url, "")).await?)
        }
        Command::Episodes { source, url } => {
            print(&registry.get(&source)?.episodes(&Anime::new(url, "")).await?)
        }
        Command::Videos { source, episode_url } => {
            let episode = Episode::new(episode_url, "", -1.0);
            print(&registry.get(&source)?.videos(&episode).await?)
        }
        Command::Filters { source } => print(&registry.get(&source)?.filter_list()),
        Command::Prefs { source, set } => {
            let source = registry.get(&source)?;
            let store = PreferenceStore::load(PreferenceStore::path_for(&prefs_dir(), source.id())).await?;
            if !set.is_empty() {
                for pair in &set {
                    let (key, value) = pair
                        .split_once('=')
                        .with_context(|| format!("Expected KEY=VALUE, got {pair}"))?;
                    let value = match value.trim() {
                        "true" => json!(true),
                        "false" => json!(false),
                        other => json!(other),
                    };
                    store.set(key.trim(), value);
                }
                store.save().await?;
            }
            print(&json!({
                "screen": source.preference_screen(),
                "values": store.snapshot(),
            }))
        }
        Command::Sniff { .. } => Ok(()),
    }
}
