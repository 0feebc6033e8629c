//! Whole-clip transforms that need their own encoder passes.
//!
//! Output of this stage is what normalization consumes.

use std::path::{Path, PathBuf};

use freepoop_common::error::FreepoopResult;
use freepoop_project_model::{ClipPlan, WholeClipTransform};

use crate::encode::EncodeSettings;
use crate::probe::{probe, StreamPresence};
use crate::toolchain::{ffmpeg_base_args, path_arg, Toolchain};

/// Runs reverse and bounce passes into a workspace directory.
pub struct TransformStage<'a> {
    tool: &'a dyn Toolchain,
    settings: &'a EncodeSettings,
    dir: &'a Path,
}

impl<'a> TransformStage<'a> {
    pub fn new(tool: &'a dyn Toolchain, settings: &'a EncodeSettings, dir: &'a Path) -> Self {
        Self {
            tool,
            settings,
            dir,
        }
    }

    /// Apply `plan.transform` and return the path normalization should read.
    pub fn apply(&self, plan: &ClipPlan) -> FreepoopResult<PathBuf> {
        let source = &plan.source.path;
        let stem = format!("xform_{:03}", plan.index);

        match plan.transform {
            WholeClipTransform::None => Ok(source.clone()),
            WholeClipTransform::Reverse => {
                let dest = self.dir.join(format!("{stem}_rev.mp4"));
                let presence = probe(self.tool, source);
                self.tool.encode(
                    &format!("reverse clip {}", plan.label()),
                    &reverse_args(source, &dest, presence, self.settings),
                )?;
                Ok(dest)
            }
            WholeClipTransform::ForwardThenReverse | WholeClipTransform::ReverseThenForward => {
                self.bounce(plan, &stem)
            }
        }
    }

    fn bounce(&self, plan: &ClipPlan, stem: &str) -> FreepoopResult<PathBuf> {
        let label = plan.label();
        let forward = self.dir.join(format!("{stem}_fwd.mp4"));
        let reversed = self.dir.join(format!("{stem}_rev.mp4"));
        let manifest = self.dir.join(format!("{stem}.txt"));
        let dest = self.dir.join(format!("{stem}_bounce.mp4"));

        // Conform the source first so both halves share codec parameters.
        let presence = probe(self.tool, &plan.source.path);
        self.tool.encode(
            &format!("{} clip {label} (forward pass)", plan.transform.as_str()),
            &conform_args(&plan.source.path, &forward, presence, self.settings),
        )?;

        self.tool.encode(
            &format!("{} clip {label} (reverse pass)", plan.transform.as_str()),
            &reverse_args(&forward, &reversed, presence, self.settings),
        )?;

        let order = match plan.transform {
            WholeClipTransform::ReverseThenForward => [&reversed, &forward],
            _ => [&forward, &reversed],
        };
        std::fs::write(&manifest, concat_manifest(&order))?;

        self.tool.encode(
            &format!("{} clip {label} (join)", plan.transform.as_str()),
            &manifest_concat_args(&manifest, &dest, self.settings),
        )?;
        Ok(dest)
    }
}

/// Single pass reversing whichever streams are present.
pub fn reverse_args(
    source: &Path,
    dest: &Path,
    presence: StreamPresence,
    settings: &EncodeSettings,
) -> Vec<String> {
    let mut args = ffmpeg_base_args();
    args.extend(["-i".to_string(), path_arg(source)]);
    if presence.video {
        args.extend([
            "-vf".to_string(),
            format!("{},reverse", settings.even_dimensions_filter()),
        ]);
    }
    if presence.audio {
        args.extend(["-af".to_string(), "areverse".to_string()]);
    }
    args.extend(settings.video_codec_args());
    args.extend(settings.audio_codec_args());
    args.push(path_arg(dest));
    args
}

fn conform_args(
    source: &Path,
    dest: &Path,
    presence: StreamPresence,
    settings: &EncodeSettings,
) -> Vec<String> {
    let mut args = ffmpeg_base_args();
    args.extend(["-i".to_string(), path_arg(source)]);
    if presence.video {
        args.extend([
            "-vf".to_string(),
            settings.even_dimensions_filter().to_string(),
        ]);
    }
    args.extend(settings.video_codec_args());
    args.extend(settings.audio_codec_args());
    args.push(path_arg(dest));
    args
}

fn manifest_concat_args(manifest: &Path, dest: &Path, settings: &EncodeSettings) -> Vec<String> {
    let mut args = ffmpeg_base_args();
    args.extend([
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        path_arg(manifest),
    ]);
    args.extend(settings.video_codec_args());
    args.extend(settings.audio_codec_args());
    args.push(path_arg(dest));
    args
}

/// Concat-demuxer manifest listing `paths` in order.
pub fn concat_manifest(paths: &[&PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', "'\\''")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_args_follow_streams() {
        let settings = EncodeSettings::default();
        let both = reverse_args(
            Path::new("a.mp4"),
            Path::new("b.mp4"),
            StreamPresence {
                video: true,
                audio: true,
            },
            &settings,
        );
        assert!(both.contains(&"scale=trunc(iw/2)*2:trunc(ih/2)*2,reverse".to_string()));
        assert!(both.contains(&"areverse".to_string()));

        let video_only = reverse_args(
            Path::new("a.gif"),
            Path::new("b.mp4"),
            StreamPresence {
                video: true,
                audio: false,
            },
            &settings,
        );
        assert!(video_only.iter().any(|a| a.ends_with(",reverse")));
        assert!(!video_only.contains(&"-af".to_string()));

        let audio_only = reverse_args(
            Path::new("a.mp3"),
            Path::new("b.mp4"),
            StreamPresence {
                video: false,
                audio: true,
            },
            &settings,
        );
        assert!(!audio_only.contains(&"-vf".to_string()));
    }

    #[test]
    fn test_odd_sized_video_is_evened_before_yuv420p() {
        let settings = EncodeSettings::default();
        let video = StreamPresence {
            video: true,
            audio: false,
        };
        let even = settings.even_dimensions_filter();

        for args in [
            reverse_args(Path::new("odd.gif"), Path::new("r.mp4"), video, &settings),
            conform_args(Path::new("odd.gif"), Path::new("f.mp4"), video, &settings),
        ] {
            let vf = &args[args.iter().position(|a| a == "-vf").unwrap() + 1];
            assert!(vf.starts_with(even), "missing even-size scale in {vf}");
            let vf_at = args.iter().position(|a| a == "-vf").unwrap();
            let pix_at = args.iter().position(|a| a == "-pix_fmt").unwrap();
            assert!(vf_at < pix_at);
        }

        let silent = conform_args(
            Path::new("song.mp3"),
            Path::new("f.mp4"),
            StreamPresence {
                video: false,
                audio: true,
            },
            &settings,
        );
        assert!(!silent.contains(&"-vf".to_string()));
    }

    #[test]
    fn test_manifest_escapes_quotes() {
        let a = PathBuf::from("/ws/it's.mp4");
        let b = PathBuf::from("/ws/b.mp4");
        let manifest = concat_manifest(&[&a, &b]);
        assert_eq!(manifest, "file '/ws/it'\\''s.mp4'\nfile '/ws/b.mp4'\n");
    }
}
