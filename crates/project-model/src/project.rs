//! Project configuration types.
//!
//! A project is the declarative description of one render: which
//! materials to use, which remote or local references to resolve, how many
//! clips to keep, and which effects to apply.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default ceiling on the number of resolved sources kept for a render.
pub const DEFAULT_CLIP_COUNT: u32 = 6;

/// Supported pitch shift range in semitones.
pub const PITCH_RANGE: std::ops::RangeInclusive<i32> = -12..=12;

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Last modified timestamp (RFC 3339).
    pub modified_at: String,

    /// Categorized local materials.
    #[serde(default)]
    pub materials: Materials,

    /// Mixed URL strings and local paths, resolved in order.
    #[serde(default)]
    pub extras: Vec<String>,

    /// Maximum number of resolved sources kept (front truncation).
    #[serde(default = "default_clip_count")]
    pub clip_count: u32,

    /// Effect toggles and parameters.
    #[serde(default)]
    pub effects: EffectSet,
}

/// Local materials grouped by category. Every list is order-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Materials {
    pub videos: Vec<PathBuf>,
    pub overlays: Vec<PathBuf>,
    pub audio: Vec<PathBuf>,
    pub sounds: Vec<PathBuf>,
    pub gifs: Vec<PathBuf>,
}

/// Material category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Video,
    Overlay,
    Audio,
    Sound,
    Gif,
}

/// Effect toggles for a render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSet {
    /// Duplicate every clip in place (A,B -> A,A,B,B).
    pub stutter: bool,

    /// Reverse every clip.
    pub reverse: bool,

    /// Shuffle sources before truncation.
    pub scramble: bool,

    /// Flat x6 gain at the end of the audio chain.
    pub earrape: bool,

    /// Composite a translucent color layer over the final video.
    pub overlay_tint: bool,

    /// Pitch shift in semitones, within [`PITCH_RANGE`].
    pub pitch_semitones: i32,

    /// Correct tempo so pitch shifting does not change clip speed.
    pub preserve_speed: bool,

    /// Pick a random cosmetic video filter per clip.
    pub glitch_filters: bool,

    /// Pick forward-then-reverse or reverse-then-forward per clip.
    /// Ignored when `reverse` is set.
    pub bounce: bool,
}

fn default_clip_count() -> u32 {
    DEFAULT_CLIP_COUNT
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 5] = [
        MaterialKind::Video,
        MaterialKind::Overlay,
        MaterialKind::Audio,
        MaterialKind::Sound,
        MaterialKind::Gif,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Overlay => "overlay",
            Self::Audio => "audio",
            Self::Sound => "sound",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialKind {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" | "videos" => Ok(Self::Video),
            "overlay" | "overlays" | "image" => Ok(Self::Overlay),
            "audio" => Ok(Self::Audio),
            "sound" | "sounds" => Ok(Self::Sound),
            "gif" | "gifs" => Ok(Self::Gif),
            other => Err(ProjectError::ValidationError {
                message: format!(
                    "unknown material kind '{other}' (expected video, overlay, audio, sound, gif)"
                ),
            }),
        }
    }
}

impl Materials {
    pub fn get(&self, kind: MaterialKind) -> &Vec<PathBuf> {
        match kind {
            MaterialKind::Video => &self.videos,
            MaterialKind::Overlay => &self.overlays,
            MaterialKind::Audio => &self.audio,
            MaterialKind::Sound => &self.sounds,
            MaterialKind::Gif => &self.gifs,
        }
    }

    pub fn get_mut(&mut self, kind: MaterialKind) -> &mut Vec<PathBuf> {
        match kind {
            MaterialKind::Video => &mut self.videos,
            MaterialKind::Overlay => &mut self.overlays,
            MaterialKind::Audio => &mut self.audio,
            MaterialKind::Sound => &mut self.sounds,
            MaterialKind::Gif => &mut self.gifs,
        }
    }

    /// Total number of local materials across all categories.
    pub fn len(&self) -> usize {
        MaterialKind::ALL.iter().map(|k| self.get(*k).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProjectConfig {
    /// Create an empty project with defaults.
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            created_at: now.clone(),
            modified_at: now,
            materials: Materials::default(),
            extras: Vec::new(),
            clip_count: DEFAULT_CLIP_COUNT,
            effects: EffectSet::default(),
        }
    }

    /// Load a project from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save the project as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ProjectError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Check the invariants a render relies on.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.clip_count == 0 {
            return Err(ProjectError::ValidationError {
                message: "clip_count must be at least 1".to_string(),
            });
        }
        if !PITCH_RANGE.contains(&self.effects.pitch_semitones) {
            return Err(ProjectError::ValidationError {
                message: format!(
                    "pitch_semitones {} outside {}..={}",
                    self.effects.pitch_semitones,
                    PITCH_RANGE.start(),
                    PITCH_RANGE.end()
                ),
            });
        }
        if self.extras.iter().any(|r| r.trim().is_empty()) {
            return Err(ProjectError::ValidationError {
                message: "extra references must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Local materials that are missing on disk, labelled by category.
    pub fn missing_materials(&self) -> Vec<String> {
        let mut missing = vec![];
        for kind in MaterialKind::ALL {
            for path in self.materials.get(kind) {
                if !path.is_file() {
                    missing.push(format!("{kind} material missing: {}", path.display()));
                }
            }
        }
        missing
    }

    /// Whether anything at all could be resolved into a source.
    pub fn has_inputs(&self) -> bool {
        !self.materials.is_empty() || !self.extras.is_empty()
    }

    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_creation_defaults() {
        let project = ProjectConfig::new("Test");
        assert_eq!(project.name, "Test");
        assert_eq!(project.clip_count, DEFAULT_CLIP_COUNT);
        assert!(!project.effects.stutter);
        assert_eq!(project.effects.pitch_semitones, 0);
        assert!(!project.has_inputs());
    }

    #[test]
    fn test_project_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("project.json");

        let mut project = ProjectConfig::new("Roundtrip");
        project.materials.videos.push(PathBuf::from("/media/a.mp4"));
        project.extras.push("https://example.com/clip.webm".to_string());
        project.effects.pitch_semitones = -5;
        project.save(&path).unwrap();

        let loaded = ProjectConfig::load(&path).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_legacy_file_without_effects_uses_defaults() {
        let json = r#"{
            "version": "1.0",
            "name": "legacy",
            "created_at": "2024-01-01T00:00:00Z",
            "modified_at": "2024-01-01T00:00:00Z",
            "materials": { "videos": ["a.mp4"] }
        }"#;
        let parsed: ProjectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.clip_count, DEFAULT_CLIP_COUNT);
        assert_eq!(parsed.effects, EffectSet::default());
        assert_eq!(parsed.materials.videos, vec![PathBuf::from("a.mp4")]);
        assert!(parsed.materials.gifs.is_empty());
    }

    #[test]
    fn test_validate_rejects_zero_clip_count() {
        let mut project = ProjectConfig::new("x");
        project.clip_count = 0;
        assert!(project.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_pitch() {
        let mut project = ProjectConfig::new("x");
        project.effects.pitch_semitones = 13;
        assert!(project.validate().is_err());
        project.effects.pitch_semitones = -12;
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_material_kind_parse() {
        assert_eq!("Video".parse::<MaterialKind>().unwrap(), MaterialKind::Video);
        assert_eq!("sounds".parse::<MaterialKind>().unwrap(), MaterialKind::Sound);
        assert!("subtitle".parse::<MaterialKind>().is_err());
    }

    #[test]
    fn test_missing_materials_reported() {
        let mut project = ProjectConfig::new("x");
        project
            .materials
            .gifs
            .push(PathBuf::from("/definitely/not/here.gif"));
        let missing = project.missing_materials();
        assert_eq!(missing.len(), 1);
        assert!(missing[0].starts_with("gif material missing"));
    }

    #[test]
    fn test_directory_material_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = ProjectConfig::new("x");
        project.materials.videos.push(dir.path().to_path_buf());
        assert_eq!(project.missing_materials().len(), 1);
    }
}
