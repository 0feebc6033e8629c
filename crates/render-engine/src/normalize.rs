//! Clip normalization.
//!
//! Re-encodes an arbitrary source into a clip with exactly one video and one
//! audio stream at the canonical encode parameters, so every clip can feed
//! the concat filter graph.

use std::path::{Path, PathBuf};

use freepoop_common::error::FreepoopResult;

use crate::encode::EncodeSettings;
use crate::probe::{probe, StreamPresence};
use crate::toolchain::{ffmpeg_base_args, path_arg, Toolchain};

/// Which synthesis branch a source takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeBranch {
    /// Re-encode both streams.
    AudioVideo,
    /// Add a silent stereo track.
    VideoOnly,
    /// Add a solid canvas for the audio's duration.
    AudioOnly,
}

impl NormalizeBranch {
    /// A source with no detected stream goes through the video-only branch
    /// and lets the encoder report the failure.
    pub fn select(presence: StreamPresence) -> Self {
        match (presence.video, presence.audio) {
            (true, true) => Self::AudioVideo,
            (false, true) => Self::AudioOnly,
            _ => Self::VideoOnly,
        }
    }
}

/// One normalization request.
#[derive(Debug, Clone)]
pub struct NormalizeRequest {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub video_filter: Option<String>,
    pub audio_filter: Option<String>,
    /// Hold a still image for this many seconds.
    pub still_secs: Option<f64>,
}

/// Build the encoder arguments for `branch`.
pub fn build_normalize_args(
    req: &NormalizeRequest,
    branch: NormalizeBranch,
    settings: &EncodeSettings,
) -> Vec<String> {
    let mut args = ffmpeg_base_args();

    if let Some(secs) = req.still_secs {
        args.extend(["-loop".to_string(), "1".to_string()]);
        args.extend(["-t".to_string(), format!("{secs}")]);
    }
    args.extend(["-i".to_string(), path_arg(&req.source)]);

    let video_graph = format!(
        "[0:v]{}{}[v]",
        prefix(req.video_filter.as_deref()),
        settings.fit_filter()
    );
    let audio_graph = format!(
        "[0:a]{}{}[a]",
        prefix(req.audio_filter.as_deref()),
        settings.audio_format_filter()
    );

    match branch {
        NormalizeBranch::AudioVideo => {
            args.extend([
                "-filter_complex".to_string(),
                format!("{video_graph};{audio_graph}"),
                "-map".to_string(),
                "[v]".to_string(),
                "-map".to_string(),
                "[a]".to_string(),
            ]);
        }
        NormalizeBranch::VideoOnly => {
            args.extend([
                "-f".to_string(),
                "lavfi".to_string(),
                "-i".to_string(),
                settings.silence_source(),
                "-filter_complex".to_string(),
                video_graph,
                "-map".to_string(),
                "[v]".to_string(),
                "-map".to_string(),
                "1:a".to_string(),
                "-shortest".to_string(),
            ]);
        }
        NormalizeBranch::AudioOnly => {
            args.extend([
                "-f".to_string(),
                "lavfi".to_string(),
                "-i".to_string(),
                settings.canvas_source(),
                "-filter_complex".to_string(),
                audio_graph,
                "-map".to_string(),
                "1:v".to_string(),
                "-map".to_string(),
                "[a]".to_string(),
                "-shortest".to_string(),
            ]);
        }
    }

    args.extend(settings.video_codec_args());
    args.extend(settings.audio_codec_args());
    args.push(path_arg(&req.dest));
    args
}

/// Drives probe + encode for one clip.
pub struct Normalizer<'a> {
    tool: &'a dyn Toolchain,
    settings: &'a EncodeSettings,
}

impl<'a> Normalizer<'a> {
    pub fn new(tool: &'a dyn Toolchain, settings: &'a EncodeSettings) -> Self {
        Self { tool, settings }
    }

    /// Normalize `req.source` into `req.dest`. `step` names the invocation in
    /// errors.
    pub fn normalize(&self, req: &NormalizeRequest, step: &str) -> FreepoopResult<NormalizeBranch> {
        let branch = if req.still_secs.is_some() {
            // An image has no audio; the probe would say so anyway.
            NormalizeBranch::VideoOnly
        } else {
            NormalizeBranch::select(probe(self.tool, &req.source))
        };

        tracing::debug!(
            source = %req.source.display(),
            dest = %req.dest.display(),
            ?branch,
            "Normalizing clip"
        );
        self.tool
            .encode(step, &build_normalize_args(req, branch, self.settings))?;
        Ok(branch)
    }
}

/// Output path for the normalized clip at `index`.
pub fn normalized_clip_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("norm_{index:03}.mp4"))
}

fn prefix(filter: Option<&str>) -> String {
    match filter {
        Some(f) if !f.is_empty() => format!("{f},"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NormalizeRequest {
        NormalizeRequest {
            source: PathBuf::from("/in/a.mp4"),
            dest: PathBuf::from("/ws/norm_000.mp4"),
            video_filter: None,
            audio_filter: None,
            still_secs: None,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let i = args.iter().position(|a| a == flag).unwrap();
        &args[i + 1]
    }

    #[test]
    fn test_branch_selection() {
        let select = |video, audio| NormalizeBranch::select(StreamPresence { video, audio });
        assert_eq!(select(true, true), NormalizeBranch::AudioVideo);
        assert_eq!(select(true, false), NormalizeBranch::VideoOnly);
        assert_eq!(select(false, true), NormalizeBranch::AudioOnly);
        assert_eq!(select(false, false), NormalizeBranch::VideoOnly);
    }

    #[test]
    fn test_audio_video_applies_both_filters() {
        let mut req = request();
        req.video_filter = Some("hue=s=0.35".to_string());
        req.audio_filter = Some("volume=6".to_string());
        let args = build_normalize_args(&req, NormalizeBranch::AudioVideo, &EncodeSettings::default());

        let graph = value_after(&args, "-filter_complex");
        assert!(graph.starts_with("[0:v]hue=s=0.35,scale=1280:720"));
        assert!(graph.contains("[0:a]volume=6,aformat=sample_rates=44100"));
        assert!(!args.contains(&"lavfi".to_string()));
        assert_eq!(args.last().unwrap(), "/ws/norm_000.mp4");
    }

    #[test]
    fn test_video_only_synthesizes_silence() {
        let args = build_normalize_args(&request(), NormalizeBranch::VideoOnly, &EncodeSettings::default());
        assert!(args.contains(&"anullsrc=channel_layout=stereo:sample_rate=44100".to_string()));
        assert!(args.contains(&"1:a".to_string()));
        assert!(args.contains(&"-shortest".to_string()));
        assert!(!value_after(&args, "-filter_complex").contains("[0:a]"));
    }

    #[test]
    fn test_audio_only_synthesizes_canvas() {
        let mut req = request();
        req.video_filter = Some("hflip".to_string());
        let args = build_normalize_args(&req, NormalizeBranch::AudioOnly, &EncodeSettings::default());
        assert!(args.contains(&"color=c=black:s=1280x720:r=30".to_string()));
        assert!(args.contains(&"1:v".to_string()));
        assert!(args.contains(&"-shortest".to_string()));
        // No source video, so the video filter has nothing to act on.
        assert!(!value_after(&args, "-filter_complex").contains("hflip"));
    }

    #[test]
    fn test_still_image_loops_for_duration() {
        let mut req = request();
        req.still_secs = Some(2.0);
        let args = build_normalize_args(&req, NormalizeBranch::VideoOnly, &EncodeSettings::default());
        let loop_at = args.iter().position(|a| a == "-loop").unwrap();
        let input_at = args.iter().position(|a| a == "-i").unwrap();
        assert!(loop_at < input_at);
        assert_eq!(value_after(&args, "-t"), "2");
    }

    #[test]
    fn test_normalized_clip_names_sort_by_index() {
        let dir = Path::new("/ws");
        assert_eq!(normalized_clip_path(dir, 7), PathBuf::from("/ws/norm_007.mp4"));
    }
}
