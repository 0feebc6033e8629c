//! Media stream probing.

use std::path::Path;

use crate::toolchain::{path_arg, Toolchain};

/// Kind of elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn selector(self) -> &'static str {
        match self {
            Self::Video => "v",
            Self::Audio => "a",
        }
    }
}

/// Which streams a source exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamPresence {
    pub video: bool,
    pub audio: bool,
}

/// Whether `path` has at least one stream of `kind`.
///
/// Any inspection failure counts as absent. Embedded cover art is not a
/// video stream.
pub fn has_stream(tool: &dyn Toolchain, path: &Path, kind: StreamKind) -> bool {
    let args = vec![
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        kind.selector().to_string(),
        "-show_entries".to_string(),
        "stream=index:stream_disposition=attached_pic".to_string(),
        "-of".to_string(),
        "csv=p=0".to_string(),
        path_arg(path),
    ];

    let Some(stdout) = tool.inspect(&args) else {
        tracing::debug!(path = %path.display(), ?kind, "Probe failed, treating stream as absent");
        return false;
    };

    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .any(|line| match kind {
            StreamKind::Video => line.rsplit(',').next() != Some("1"),
            StreamKind::Audio => true,
        })
}

/// Probe both stream kinds.
pub fn probe(tool: &dyn Toolchain, path: &Path) -> StreamPresence {
    let presence = StreamPresence {
        video: has_stream(tool, path, StreamKind::Video),
        audio: has_stream(tool, path, StreamKind::Audio),
    };
    tracing::debug!(
        path = %path.display(),
        video = presence.video,
        audio = presence.audio,
        "Probed source"
    );
    presence
}
