//! Preview a single media file or remote reference.

use std::path::PathBuf;

use freepoop_common::config::AppConfig;
use freepoop_render_engine::fetch::{is_remote_reference, Fetcher, RemoteFetcher};
use freepoop_render_engine::preview::{preview_file, PreviewOutcome};

pub async fn run(config: AppConfig, target: String, duration: f64) -> anyhow::Result<()> {
    let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<PreviewOutcome> {
        let local = PathBuf::from(&target);
        if local.exists() || !is_remote_reference(&target) {
            return Ok(preview_file(&local, duration, &config.toolchain)?);
        }

        println!("Downloading {target}...");
        // Removed when the preview returns; an opened clip is encoded elsewhere.
        let downloads = download_dir()?;
        let fetcher = RemoteFetcher::new(&config.toolchain, &config.fetch);
        let path = fetcher.fetch(&target, downloads.path())?;
        println!("  Saved to {}", path.display());
        Ok(preview_file(&path, duration, &config.toolchain)?)
    })
    .await??;

    match outcome {
        PreviewOutcome::Played => println!("Preview finished."),
        PreviewOutcome::Opened(clip) => println!("Opened preview clip: {}", clip.display()),
    }
    Ok(())
}

fn download_dir() -> std::io::Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("freepoop_preview_download_")
        .tempdir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_preview_gets_its_own_download_dir() {
        let first = download_dir().unwrap();
        let second = download_dir().unwrap();
        assert_ne!(first.path(), second.path());

        let path = first.path().to_path_buf();
        drop(first);
        assert!(!path.exists());
    }
}
