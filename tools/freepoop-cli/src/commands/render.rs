//! Render a project to video.

use std::sync::Arc;

use freepoop_common::config::AppConfig;
use freepoop_project_model::{ProjectConfig, ProjectSession};
use freepoop_render_engine::toolchain::SystemToolchain;
use freepoop_render_engine::{render_project, ProgressCallback, RenderJob, RenderPipeline};

use crate::RenderArgs;

pub async fn run(config: AppConfig, args: RenderArgs) -> anyhow::Result<()> {
    println!("Rendering project at: {}", args.project.display());

    let project = ProjectConfig::load(&args.project)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    let project = apply_overrides(project, &args)?;

    if !SystemToolchain::new(&config.toolchain).is_available() {
        return Err(anyhow::anyhow!(
            "ffmpeg/ffprobe not found (configured: {}, {}); run `freepoop check`",
            config.toolchain.ffmpeg.display(),
            config.toolchain.ffprobe.display()
        ));
    }

    println!("  Output: {}", args.output.display());
    println!("  Clip count: {}", project.clip_count);
    if let Some(seed) = args.seed {
        println!("  Seed: {seed}");
    }

    let mut job = RenderJob::new(project, args.output.clone());
    job.seed = args.seed;

    let pipeline = Arc::new(RenderPipeline::new(config));
    let progress: ProgressCallback = Box::new(|message: &str| println!("  {message}"));

    match render_project(pipeline, job, Some(progress)).await {
        Ok(report) => {
            println!("\nRender complete: {}", report.output.display());
            println!("  Clips: {}", report.clips.len());
            if !report.skipped.is_empty() {
                println!("  Skipped: {}", report.skipped.len());
                for item in &report.skipped {
                    println!("    {item}");
                }
            }
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Render failed: {e}")),
    }
}

/// Command-line flags switch effects on; they never switch them off.
fn apply_overrides(project: ProjectConfig, args: &RenderArgs) -> anyhow::Result<ProjectConfig> {
    let mut session = ProjectSession::from_config(project);
    if let Some(clips) = args.clips {
        session
            .set_clip_count(clips)
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    }

    let effects = session.effects_mut();
    effects.stutter |= args.stutter;
    effects.reverse |= args.reverse;
    effects.scramble |= args.scramble;
    effects.earrape |= args.earrape;
    effects.overlay_tint |= args.overlay;
    effects.glitch_filters |= args.glitch;
    effects.bounce |= args.bounce;
    effects.preserve_speed |= args.preserve_speed;
    if let Some(pitch) = args.pitch {
        effects.pitch_semitones = pitch;
    }

    session
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid render options: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> RenderArgs {
        match crate::Cli::try_parse_from(argv).unwrap().command {
            crate::Commands::Render(args) => args,
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_flags_enable_effects_and_keep_project_settings() {
        let mut project = ProjectConfig::new("p");
        project.effects.reverse = true;

        let args = parse(&[
            "freepoop", "render", "p.json", "--stutter", "--pitch", "-3", "--clips", "2",
        ]);
        let project = apply_overrides(project, &args).unwrap();

        assert!(project.effects.stutter);
        assert!(project.effects.reverse);
        assert_eq!(project.effects.pitch_semitones, -3);
        assert_eq!(project.clip_count, 2);
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let args = parse(&["freepoop", "render", "p.json", "--pitch", "24"]);
        assert!(apply_overrides(ProjectConfig::new("p"), &args).is_err());

        let args = parse(&["freepoop", "render", "p.json", "--clips", "0"]);
        assert!(apply_overrides(ProjectConfig::new("p"), &args).is_err());
    }
}
