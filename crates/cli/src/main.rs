//! `oembed` command line entry point.
//!
//! Loads the layered configuration, builds a registry and prints the oEmbed
//! document for one resource URL as JSON on stdout. Logging goes to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use oembed_client::{Endpoint, Registry};
use oembed_core::{AppConfig, Params};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oembed", version, about = "Fetch oEmbed metadata for a resource URL")]
struct Cli {
    /// Resource URL to describe.
    url: String,

    /// TOML configuration file (defaults to $OEMBED_CONFIG_FILE).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra endpoint parameter as key=value; repeatable.
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Fall back to <link> discovery even if the configuration disables it.
    #[arg(long)]
    discover: bool,

    /// Use the configured endpoint with this key instead of pattern matching.
    #[arg(long, conflicts_with = "endpoint")]
    key: Option<String>,

    /// Call this oEmbed endpoint URL directly.
    #[arg(long)]
    endpoint: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(Some(path.as_path())),
        None => AppConfig::load(),
    }
    .context("loading configuration")?;

    if cli.discover {
        config.discovery = true;
    }

    let registry = Registry::from_app_config(&config).context("building registry")?;
    let params: Params = cli.params.into_iter().collect();

    tracing::info!("looking up {}", cli.url);

    let oembed = if let Some(oembed_url) = &cli.endpoint {
        Endpoint::new(oembed_url.as_str(), Params::new())
            .get(registry.gateway(), &cli.url, &params)
            .await?
    } else if let Some(key) = &cli.key {
        registry.get_endpoint(key)?.get(registry.gateway(), &cli.url, &params).await?
    } else {
        registry.get(&cli.url, &params).await?
    };

    println!("{}", serde_json::to_string_pretty(&oembed)?);

    Ok(())
}
