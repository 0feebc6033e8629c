//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FreepoopError, FreepoopResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// External media toolchain binaries.
    pub toolchain: ToolchainConfig,

    /// Fixed encode parameters used by every render.
    pub render: RenderDefaults,

    /// Remote fetch behaviour.
    pub fetch: FetchConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Names or paths of the external tools the pipeline shells out to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub ffplay: PathBuf,
    pub yt_dlp: PathBuf,
}

/// Canonical encode parameters for normalized clips and the final output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Target box every clip is scaled to fit.
    pub width: u32,
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Audio sample rate for normalized clips and synthesized silence.
    pub sample_rate: u32,

    /// x264 constant rate factor.
    pub video_crf: u32,

    /// x264 preset.
    pub video_preset: String,

    /// AAC bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Color source used by the tint overlay pass.
    pub tint_color: String,

    /// How long an overlay image is held on screen.
    pub still_image_secs: f64,

    /// Parent directory for per-render workspaces (system temp when unset).
    pub workspace_root: Option<PathBuf>,
}

/// Remote fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Try the site-aware extractor before plain HTTP.
    pub prefer_extractor: bool,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "freepoop=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            ffplay: PathBuf::from("ffplay"),
            yt_dlp: PathBuf::from("yt-dlp"),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            sample_rate: 44100,
            video_crf: 23,
            video_preset: "veryfast".to_string(),
            audio_bitrate_kbps: 192,
            tint_color: "green@0.14".to_string(),
            still_image_secs: 2.0,
            workspace_root: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            prefer_extractor: true,
            timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RenderDefaults {
    /// `WxH` form used by ffmpeg size options.
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    fn validate(&self) -> FreepoopResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FreepoopError::config("render width/height must be non-zero"));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(FreepoopError::config(
                "render width/height must be even (yuv420p output)",
            ));
        }
        if self.fps == 0 {
            return Err(FreepoopError::config("render fps must be non-zero"));
        }
        if self.sample_rate == 0 {
            return Err(FreepoopError::config("render sample_rate must be non-zero"));
        }
        if self.still_image_secs.is_nan() || self.still_image_secs <= 0.0 {
            return Err(FreepoopError::config(
                "render still_image_secs must be positive",
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::from_file(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> FreepoopResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FreepoopError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    pub fn validate(&self) -> FreepoopResult<()> {
        self.render.validate()?;
        if self.fetch.timeout_secs == 0 {
            return Err(FreepoopError::config("fetch timeout_secs must be non-zero"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("freepoop").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_odd_dimensions_rejected() {
        let mut config = AppConfig::default();
        config.render.width = 1281;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_still_duration_rejected() {
        let mut config = AppConfig::default();
        config.render.still_image_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.render.tint_color = "red@0.2".to_string();
        config.toolchain.ffmpeg = PathBuf::from("/opt/ffmpeg/bin/ffmpeg");
        config.save_to(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.render.tint_color, "red@0.2");
        assert_eq!(loaded.toolchain.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(loaded.render.width, 1280);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig = serde_json::from_str(r#"{"render":{"fps":24}}"#).unwrap();
        assert_eq!(parsed.render.fps, 24);
        assert_eq!(parsed.render.sample_rate, 44100);
        assert_eq!(parsed.toolchain.ffprobe, PathBuf::from("ffprobe"));
        assert!(parsed.fetch.prefer_extractor);
    }
}
