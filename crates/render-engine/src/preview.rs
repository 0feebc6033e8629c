//! Single-file preview.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use freepoop_common::config::ToolchainConfig;
use freepoop_common::error::{FreepoopError, FreepoopResult};

use crate::toolchain::{command_exists, ffmpeg_base_args, path_arg};

/// Default preview length in seconds.
pub const DEFAULT_PREVIEW_SECS: f64 = 6.0;

/// How a preview was shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// Played directly with ffplay.
    Played,
    /// Encoded to a clip and handed to the desktop opener.
    Opened(PathBuf),
}

/// Play the first `duration_secs` of `path`.
///
/// Blocks until the player exits.
pub fn preview_file(
    path: &Path,
    duration_secs: f64,
    toolchain: &ToolchainConfig,
) -> FreepoopResult<PreviewOutcome> {
    if !path.exists() {
        return Err(FreepoopError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let duration = if duration_secs.is_finite() && duration_secs > 0.0 {
        duration_secs
    } else {
        DEFAULT_PREVIEW_SECS
    };

    if command_exists(&toolchain.ffplay) {
        tracing::info!(path = %path.display(), duration, "Previewing with ffplay");
        let status = Command::new(&toolchain.ffplay)
            .args(ffplay_args(path, duration))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| FreepoopError::external_tool("preview", "not started", e.to_string()))?;
        if !status.success() {
            return Err(FreepoopError::external_tool("preview", status.to_string(), ""));
        }
        return Ok(PreviewOutcome::Played);
    }

    // No ffplay: render a short clip and open it.
    let dir = tempfile::Builder::new()
        .prefix("freepoop_preview_")
        .tempdir()?
        .into_path();
    let clip = dir.join("preview.mp4");
    let mut args = ffmpeg_base_args();
    args.extend([
        "-i".to_string(),
        path_arg(path),
        "-t".to_string(),
        format!("{duration}"),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        path_arg(&clip),
    ]);

    let output = Command::new(&toolchain.ffmpeg)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| FreepoopError::external_tool("preview clip", "not started", e.to_string()))?;
    if !output.status.success() {
        return Err(FreepoopError::external_tool(
            "preview clip",
            output.status.to_string(),
            String::from_utf8_lossy(&output.stderr).trim(),
        ));
    }

    open_with_desktop(&clip)?;
    Ok(PreviewOutcome::Opened(clip))
}

fn ffplay_args(path: &Path, duration: f64) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-autoexit".to_string(),
        "-t".to_string(),
        format!("{duration}"),
        path_arg(path),
    ]
}

fn open_with_desktop(path: &Path) -> FreepoopResult<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    tracing::info!(path = %path.display(), opener, "Opening preview clip");
    Command::new(opener)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| FreepoopError::external_tool("open preview", "not started", e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_reported() {
        let err = preview_file(
            Path::new("/definitely/missing.mp4"),
            DEFAULT_PREVIEW_SECS,
            &ToolchainConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FreepoopError::FileNotFound { .. }));
    }

    #[test]
    fn test_ffplay_args_exit_after_duration() {
        let args = ffplay_args(Path::new("a.mp4"), 6.0);
        assert!(args.contains(&"-autoexit".to_string()));
        assert!(!args.contains(&"-nodisp".to_string()));
        assert_eq!(args[args.len() - 2], "6");
    }
}
