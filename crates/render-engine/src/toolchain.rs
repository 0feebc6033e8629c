//! External media toolchain seam.
//!
//! The pipeline never spawns processes directly; it goes through
//! [`Toolchain`] so a render can be driven against the real `ffmpeg` /
//! `ffprobe` binaries or against a recording fake.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use freepoop_common::config::ToolchainConfig;
use freepoop_common::error::{FreepoopError, FreepoopResult};

/// Maximum stderr kept in an error message.
const STDERR_TAIL_BYTES: usize = 2000;

/// Encoder and stream-inspection tools.
pub trait Toolchain: Send + Sync {
    /// Run the encoder with `args`. A spawn failure or non-zero exit is an
    /// [`FreepoopError::ExternalTool`] naming `step`.
    fn encode(&self, step: &str, args: &[String]) -> FreepoopResult<()>;

    /// Run the stream inspector with `args` and return its stdout, or `None`
    /// when it could not run or exited non-zero.
    fn inspect(&self, args: &[String]) -> Option<String>;
}

/// Toolchain backed by system binaries.
#[derive(Debug, Clone)]
pub struct SystemToolchain {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl SystemToolchain {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg.clone(),
            ffprobe: config.ffprobe.clone(),
        }
    }

    /// Whether the encoder binary can be found.
    pub fn is_available(&self) -> bool {
        command_exists(&self.ffmpeg) && command_exists(&self.ffprobe)
    }
}

impl Toolchain for SystemToolchain {
    fn encode(&self, step: &str, args: &[String]) -> FreepoopResult<()> {
        tracing::debug!(step, args = ?args, "Running ffmpeg");
        let started = std::time::Instant::now();

        let output = Command::new(&self.ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                FreepoopError::external_tool(
                    step,
                    "not started",
                    format!("failed to start {}: {e}", self.ffmpeg.display()),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FreepoopError::external_tool(
                step,
                output.status.to_string(),
                stderr_tail(stderr.trim()),
            ));
        }

        tracing::debug!(
            step,
            elapsed_ms = started.elapsed().as_millis(),
            "ffmpeg finished"
        );
        Ok(())
    }

    fn inspect(&self, args: &[String]) -> Option<String> {
        let output = Command::new(&self.ffprobe)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .ok()?;

        if !output.status.success() {
            tracing::debug!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "ffprobe failed"
            );
            return None;
        }

        String::from_utf8(output.stdout).ok()
    }
}

/// Whether `binary` resolves to an executable (bare name on PATH or a path).
pub fn command_exists(binary: &Path) -> bool {
    which::which(binary).is_ok()
}

/// Standard encoder prefix: overwrite, quiet banner, errors only.
pub fn ffmpeg_base_args() -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-nostdin".to_string(),
    ]
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn stderr_tail(stderr: &str) -> String {
    if stderr.len() <= STDERR_TAIL_BYTES {
        return stderr.to_string();
    }
    let mut start = stderr.len() - STDERR_TAIL_BYTES;
    while !stderr.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &stderr[start..])
}
