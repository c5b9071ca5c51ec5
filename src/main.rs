// Example runner: reads a `PageAssets` JSON file, fetches over HTTP and prints the
// resulting `AssetReport` as JSON. An engine config file can be named in
// `ASSET_GATE_CONFIG`.

use anyhow::{Context, Result};
use asset_gate::assets::HttpFetcher;
use asset_gate::{AssetPipeline, EngineConfig, PageAssets};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("asset_gate=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: asset_gate <page-assets.json>")?;
    let page: PageAssets = serde_json::from_str(
        &std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
    )
    .with_context(|| format!("parsing {path}"))?;

    let config = match std::env::var("ASSET_GATE_CONFIG") {
        Ok(config_path) => {
            let json = std::fs::read_to_string(&config_path).with_context(|| format!("reading {config_path}"))?;
            EngineConfig::from_json_str(&json)?
        }
        Err(_) => EngineConfig::default(),
    };

    let fetcher = HttpFetcher::new(&config.fetch)?;
    let pipeline = AssetPipeline::new(config, Arc::new(fetcher))?;

    info!(domain = %page.domain, "selecting assets");
    let report = pipeline.run(&page).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
