//! Download a remote reference.

use std::path::PathBuf;

use freepoop_common::config::AppConfig;
use freepoop_render_engine::fetch::{Fetcher, RemoteFetcher};

pub async fn run(config: AppConfig, url: String, output: PathBuf) -> anyhow::Result<()> {
    println!("Fetching {url}");
    println!("  Destination: {}", output.display());

    let path = tokio::task::spawn_blocking(move || {
        RemoteFetcher::new(&config.toolchain, &config.fetch).fetch(&url, &output)
    })
    .await??;

    println!("Saved: {}", path.display());
    Ok(())
}
