//! Concatenation and tint overlay passes.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::encode::EncodeSettings;
use crate::toolchain::{ffmpeg_base_args, path_arg};

/// Join normalized clips with a stream-matching concat filter graph.
///
/// Each input is conformed to the full canvas first, since the concat filter
/// needs identical frame sizes.
pub fn concat_args(clips: &[PathBuf], dest: &Path, settings: &EncodeSettings) -> Vec<String> {
    let mut args = ffmpeg_base_args();
    for clip in clips {
        args.extend(["-i".to_string(), path_arg(clip)]);
    }

    let canvas = settings.canvas_filter();
    let aformat = settings.audio_format_filter();
    let mut graph = String::new();
    for i in 0..clips.len() {
        let _ = write!(graph, "[{i}:v]{canvas}[v{i}];[{i}:a]{aformat}[a{i}];");
    }
    for i in 0..clips.len() {
        let _ = write!(graph, "[v{i}][a{i}]");
    }
    let _ = write!(graph, "concat=n={}:v=1:a=1[v][a]", clips.len());

    args.extend([
        "-filter_complex".to_string(),
        graph,
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "[a]".to_string(),
    ]);
    args.extend(settings.video_codec_args());
    args.extend(settings.audio_codec_args());
    args.push(path_arg(dest));
    args
}

/// Composite the translucent tint over `source`, copying audio through.
pub fn overlay_args(source: &Path, dest: &Path, settings: &EncodeSettings) -> Vec<String> {
    let mut args = ffmpeg_base_args();
    args.extend([
        "-i".to_string(),
        path_arg(source),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        settings.tint_source(),
        "-filter_complex".to_string(),
        "[1:v]format=rgba[tint];[0:v][tint]overlay=(W-w)/2:(H-h)/2:shortest=1[v]".to_string(),
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "0:a?".to_string(),
    ]);
    args.extend(settings.video_codec_args());
    args.extend(["-c:a".to_string(), "copy".to_string()]);
    args.push(path_arg(dest));
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_counts_stream_pairs() {
        let clips: Vec<PathBuf> = (0..4).map(|i| PathBuf::from(format!("norm_{i:03}.mp4"))).collect();
        let args = concat_args(&clips, Path::new("concat.mp4"), &EncodeSettings::default());

        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 4);
        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(graph.contains("[v0][a0][v1][a1][v2][a2][v3][a3]concat=n=4:v=1:a=1[v][a]"));
        assert_eq!(graph.matches("pad=1280:720").count(), 4);
    }

    #[test]
    fn test_overlay_copies_audio() {
        let args = overlay_args(Path::new("concat.mp4"), Path::new("tinted.mp4"), &EncodeSettings::default());
        assert!(args.contains(&"color=c=green@0.14:s=1280x720:r=30".to_string()));
        let codec = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[codec + 1], "copy");
        assert_eq!(args.last().unwrap(), "tinted.mp4");
    }
}
