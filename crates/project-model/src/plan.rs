//! Resolved sources and per-clip render decisions.

use std::path::{Path, PathBuf};

use crate::project::MaterialKind;

/// Where a resolved source came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// A categorized local material.
    Material(MaterialKind),
    /// An extra reference that already existed on disk.
    LocalReference,
    /// An extra reference downloaded into the render workspace.
    Fetched { reference: String },
}

/// One playable unit ready for processing. Never mutated once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    pub path: PathBuf,
    pub origin: SourceOrigin,
}

impl SourceItem {
    pub fn material(path: impl Into<PathBuf>, kind: MaterialKind) -> Self {
        Self {
            path: path.into(),
            origin: SourceOrigin::Material(kind),
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            origin: SourceOrigin::LocalReference,
        }
    }

    pub fn fetched(path: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            origin: SourceOrigin::Fetched {
                reference: reference.into(),
            },
        }
    }

    /// Overlay images are held on screen as still clips.
    pub fn is_still_image(&self) -> bool {
        matches!(self.origin, SourceOrigin::Material(MaterialKind::Overlay))
    }

    /// File name for progress messages.
    pub fn basename(&self) -> String {
        basename(&self.path)
    }
}

pub(crate) fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Transform that needs its own encoder pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WholeClipTransform {
    #[default]
    None,
    Reverse,
    ForwardThenReverse,
    ReverseThenForward,
}

impl WholeClipTransform {
    /// The two stochastic bounce transforms.
    pub const BOUNCE: [WholeClipTransform; 2] = [
        WholeClipTransform::ForwardThenReverse,
        WholeClipTransform::ReverseThenForward,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Reverse => "reverse",
            Self::ForwardThenReverse => "forward-then-reverse",
            Self::ReverseThenForward => "reverse-then-forward",
        }
    }
}

/// Per-clip stylistic video filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CosmeticFilter {
    Pixelate,
    Degrade,
    Emboss,
    MirrorHorizontal,
    MirrorVertical,
}

impl CosmeticFilter {
    pub const ALL: [CosmeticFilter; 5] = [
        CosmeticFilter::Pixelate,
        CosmeticFilter::Degrade,
        CosmeticFilter::Emboss,
        CosmeticFilter::MirrorHorizontal,
        CosmeticFilter::MirrorVertical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pixelate => "pixelate",
            Self::Degrade => "degrade",
            Self::Emboss => "emboss",
            Self::MirrorHorizontal => "mirror-horizontal",
            Self::MirrorVertical => "mirror-vertical",
        }
    }
}

/// Everything decided about one clip before any encoder runs.
///
/// Exactly one whole-clip transform and at most one cosmetic filter. The
/// audio chain is already ordered: pitch, tremolo, loudness.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlan {
    /// Zero-based position in the ordered list.
    pub index: usize,
    /// Length of the ordered list.
    pub total: usize,
    pub source: SourceItem,
    pub transform: WholeClipTransform,
    pub cosmetic: Option<CosmeticFilter>,
    pub tremolo: bool,
    pub audio_filter: Option<String>,
}

impl ClipPlan {
    /// `index/total (basename)` label used in progress and error messages.
    pub fn label(&self) -> String {
        format!(
            "{}/{} ({})",
            self.index + 1,
            self.total,
            self.source.basename()
        )
    }

    pub fn video_filter_name(&self) -> &'static str {
        self.cosmetic.map(CosmeticFilter::as_str).unwrap_or("none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_material_is_still_image() {
        assert!(SourceItem::material("/a.png", MaterialKind::Overlay).is_still_image());
        assert!(!SourceItem::material("/a.gif", MaterialKind::Gif).is_still_image());
        assert!(!SourceItem::local("/a.png").is_still_image());
    }

    #[test]
    fn test_clip_label_is_one_based() {
        let plan = ClipPlan {
            index: 2,
            total: 4,
            source: SourceItem::fetched("/tmp/ws/cat video.mp4", "https://example.com/v"),
            transform: WholeClipTransform::None,
            cosmetic: None,
            tremolo: false,
            audio_filter: None,
        };
        assert_eq!(plan.label(), "3/4 (cat video.mp4)");
        assert_eq!(plan.video_filter_name(), "none");
    }
}
