//! Render pipeline orchestration.
//!
//! One invocation walks resolve → order → per-clip transform/normalize →
//! concatenate → optional tint → finalize, strictly in sequence, inside its
//! own [`Workspace`]. The workspace is removed on every exit path.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use freepoop_common::config::AppConfig;
use freepoop_common::error::{FreepoopError, FreepoopResult};
use freepoop_project_model::{
    ClipPlan, CosmeticFilter, EffectSet, MaterialKind, ProjectConfig, SourceItem,
    WholeClipTransform,
};

use crate::assemble::{concat_args, overlay_args};
use crate::encode::EncodeSettings;
use crate::fetch::{Fetcher, RemoteFetcher};
use crate::filters::{audio_chain, cosmetic_filter, TREMOLO_PROBABILITY};
use crate::normalize::{normalized_clip_path, NormalizeRequest, Normalizer};
use crate::ordering::OrderingPolicy;
use crate::toolchain::{SystemToolchain, Toolchain};
use crate::transform::TransformStage;
use crate::workspace::Workspace;

/// Progress callback for hosts: receives human-readable status lines.
pub type ProgressCallback = Box<dyn Fn(&str) + Send>;

/// Local material categories in resolution order.
const RESOLUTION_ORDER: [MaterialKind; 5] = [
    MaterialKind::Video,
    MaterialKind::Gif,
    MaterialKind::Sound,
    MaterialKind::Audio,
    MaterialKind::Overlay,
];

/// States of one render invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    ResolvingSources,
    OrderingSources,
    PerClipProcessing,
    Concatenating,
    OverlayPass,
    Finalizing,
    Done,
}

impl RenderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolvingSources => "resolving_sources",
            Self::OrderingSources => "ordering_sources",
            Self::PerClipProcessing => "per_clip_processing",
            Self::Concatenating => "concatenating",
            Self::OverlayPass => "overlay_pass",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        }
    }
}

/// A render request.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Project to render. Validated before anything runs.
    pub project: ProjectConfig,

    /// Final output file. Its extension picks the container.
    pub output_path: PathBuf,

    /// Seed for shuffle and per-clip random choices (entropy when `None`).
    pub seed: Option<u64>,
}

impl RenderJob {
    pub fn new(project: ProjectConfig, output_path: impl Into<PathBuf>) -> Self {
        Self {
            project,
            output_path: output_path.into(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Outcome of a successful render.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub output: PathBuf,

    /// Plans of every processed clip, in output order.
    pub clips: Vec<ClipPlan>,

    pub overlay_applied: bool,

    /// Materials and references that were skipped during resolution.
    pub skipped: Vec<String>,
}

/// Drives one render at a time against a toolchain and fetcher.
pub struct RenderPipeline {
    config: AppConfig,
    settings: EncodeSettings,
    toolchain: Arc<dyn Toolchain>,
    fetcher: Arc<dyn Fetcher>,
}

impl RenderPipeline {
    /// Pipeline backed by the system ffmpeg/ffprobe and the remote fetcher.
    pub fn new(config: AppConfig) -> Self {
        let toolchain = Arc::new(SystemToolchain::new(&config.toolchain));
        let fetcher = Arc::new(RemoteFetcher::new(&config.toolchain, &config.fetch));
        Self::with_collaborators(config, toolchain, fetcher)
    }

    pub fn with_collaborators(
        config: AppConfig,
        toolchain: Arc<dyn Toolchain>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let settings = EncodeSettings::from(&config.render);
        Self {
            config,
            settings,
            toolchain,
            fetcher,
        }
    }

    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }

    /// Run one render to completion or failure. Blocks.
    pub fn run(&self, job: &RenderJob, progress: &dyn Fn(&str)) -> FreepoopResult<RenderReport> {
        tracing::info!(
            project = %job.project.name,
            output = %job.output_path.display(),
            seed = ?job.seed,
            "Starting render"
        );

        job.project
            .validate()
            .map_err(|e| FreepoopError::project(e.to_string()))?;
        if !job.project.has_inputs() {
            return Err(FreepoopError::NoSources);
        }

        let workspace = Workspace::create(self.config.render.workspace_root.as_deref())?;
        let result = self.run_in_workspace(job, &workspace, progress);

        let workspace_path = workspace.path().to_path_buf();
        if let Err(e) = workspace.cleanup() {
            tracing::warn!(path = %workspace_path.display(), error = %e, "Workspace cleanup failed");
        }

        match &result {
            Ok(report) => tracing::info!(
                output = %report.output.display(),
                clips = report.clips.len(),
                overlay = report.overlay_applied,
                "Render complete"
            ),
            Err(e) => tracing::error!(error = %e, "Render failed"),
        }
        result
    }

    fn run_in_workspace(
        &self,
        job: &RenderJob,
        workspace: &Workspace,
        progress: &dyn Fn(&str),
    ) -> FreepoopResult<RenderReport> {
        let project = &job.project;
        let effects = &project.effects;
        let mut rng = match job.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        enter(RenderStage::ResolvingSources);
        progress("Resolving sources...");
        let mut skipped = Vec::new();
        let sources = self.resolve_sources(project, workspace, progress, &mut skipped)?;

        enter(RenderStage::OrderingSources);
        let policy = OrderingPolicy {
            scramble: effects.scramble,
            clip_count: project.clip_count as usize,
            stutter: effects.stutter,
        };
        let resolved = sources.len();
        let ordered = policy.apply(sources, &mut rng);
        tracing::info!(resolved, ordered = ordered.len(), "Ordered sources");

        enter(RenderStage::PerClipProcessing);
        let plans = plan_clips(ordered, effects, self.settings.sample_rate, &mut rng);
        let transforms = TransformStage::new(self.toolchain.as_ref(), &self.settings, workspace.path());
        let normalizer = Normalizer::new(self.toolchain.as_ref(), &self.settings);
        let mut normalized = Vec::with_capacity(plans.len());

        for plan in &plans {
            let label = plan.label();
            progress(&format!("Processing clip {label}"));
            tracing::info!(
                clip = plan.index + 1,
                total = plan.total,
                transform = plan.transform.as_str(),
                video_filter = plan.video_filter_name(),
                tremolo = plan.tremolo,
                "Processing clip"
            );

            let input = transforms.apply(plan)?;
            let request = NormalizeRequest {
                source: input,
                dest: normalized_clip_path(workspace.path(), plan.index),
                video_filter: plan.cosmetic.map(cosmetic_filter),
                audio_filter: plan.audio_filter.clone(),
                still_secs: plan
                    .source
                    .is_still_image()
                    .then_some(self.settings.still_image_secs),
            };
            normalizer.normalize(&request, &format!("normalize clip {label}"))?;
            normalized.push(request.dest);
        }

        enter(RenderStage::Concatenating);
        let ext = output_extension(&job.output_path);
        let count = normalized.len();
        progress(&format!("Concatenating {count} clips..."));
        let concatenated = workspace.file(&format!("concat.{ext}"));
        self.toolchain.encode(
            &format!("concatenate {count} clips"),
            &concat_args(&normalized, &concatenated, &self.settings),
        )?;

        let mut final_artifact = concatenated;
        if effects.overlay_tint {
            enter(RenderStage::OverlayPass);
            progress("Applying overlay tint...");
            let tinted = workspace.file(&format!("tinted.{ext}"));
            self.toolchain
                .encode("overlay tint", &overlay_args(&final_artifact, &tinted, &self.settings))?;
            final_artifact = tinted;
        }

        enter(RenderStage::Finalizing);
        progress("Finalizing...");
        move_into_place(&final_artifact, &job.output_path)?;

        enter(RenderStage::Done);
        progress(&format!("Done: {}", job.output_path.display()));
        Ok(RenderReport {
            output: job.output_path.clone(),
            clips: plans,
            overlay_applied: effects.overlay_tint,
            skipped,
        })
    }

    fn resolve_sources(
        &self,
        project: &ProjectConfig,
        workspace: &Workspace,
        progress: &dyn Fn(&str),
        skipped: &mut Vec<String>,
    ) -> FreepoopResult<Vec<SourceItem>> {
        let mut sources = Vec::new();

        for kind in RESOLUTION_ORDER {
            for path in project.materials.get(kind) {
                if path.is_file() {
                    sources.push(SourceItem::material(path.clone(), kind));
                } else {
                    tracing::warn!(kind = %kind, path = %path.display(), "Skipping missing material");
                    progress(&format!("Skipping missing {kind}: {}", path.display()));
                    skipped.push(path.display().to_string());
                }
            }
        }

        for (slot, reference) in project.extras.iter().enumerate() {
            let local = Path::new(reference);
            if local.is_file() {
                sources.push(SourceItem::local(local));
                continue;
            }

            progress(&format!("Downloading {reference}..."));
            let downloads = workspace.download_slot(slot)?;
            match self.fetcher.fetch(reference, &downloads) {
                Ok(path) => sources.push(SourceItem::fetched(path, reference.clone())),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(reference = %reference, error = %e, "Skipping reference");
                    progress(&format!("Download failed: {e}"));
                    skipped.push(reference.clone());
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(count = sources.len(), skipped = skipped.len(), "Resolved sources");
        if sources.is_empty() {
            return Err(FreepoopError::NoSources);
        }
        Ok(sources)
    }
}

/// Decide transform, cosmetic filter and audio chain for each ordered source.
///
/// Still images never get a whole-clip transform. `reverse` applies to every
/// other clip and takes precedence over `bounce`.
pub fn plan_clips<R: Rng>(
    sources: Vec<SourceItem>,
    effects: &EffectSet,
    sample_rate: u32,
    rng: &mut R,
) -> Vec<ClipPlan> {
    let total = sources.len();
    sources
        .into_iter()
        .enumerate()
        .map(|(index, source)| {
            let transform = if source.is_still_image() {
                WholeClipTransform::None
            } else if effects.reverse {
                WholeClipTransform::Reverse
            } else if effects.bounce {
                WholeClipTransform::BOUNCE[rng.gen_range(0..WholeClipTransform::BOUNCE.len())]
            } else {
                WholeClipTransform::None
            };

            // One slot past the pool means no filter.
            let cosmetic = if effects.glitch_filters {
                CosmeticFilter::ALL
                    .get(rng.gen_range(0..=CosmeticFilter::ALL.len()))
                    .copied()
            } else {
                None
            };

            let tremolo = rng.gen_bool(TREMOLO_PROBABILITY);
            let audio_filter = audio_chain(
                effects.pitch_semitones,
                effects.preserve_speed,
                tremolo,
                effects.earrape,
                sample_rate,
            );

            ClipPlan {
                index,
                total,
                source,
                transform,
                cosmetic,
                tremolo,
                audio_filter,
            }
        })
        .collect()
}

/// Async entry for hosts: runs the blocking pipeline off the caller's thread.
pub async fn render_project(
    pipeline: Arc<RenderPipeline>,
    job: RenderJob,
    progress: Option<ProgressCallback>,
) -> FreepoopResult<RenderReport> {
    tokio::task::spawn_blocking(move || {
        let report = |message: &str| {
            if let Some(cb) = &progress {
                cb(message);
            }
        };
        pipeline.run(&job, &report)
    })
    .await
    .map_err(|e| FreepoopError::Other(anyhow::anyhow!("render task failed: {e}")))?
}

fn enter(stage: RenderStage) {
    tracing::debug!(stage = stage.as_str(), "Entering stage");
}

fn output_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("mp4")
        .to_ascii_lowercase()
}

/// Move `src` to `dest`, copying when a rename is not possible. A failed copy
/// leaves nothing at `dest`.
fn move_into_place(src: &Path, dest: &Path) -> FreepoopResult<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }

    tracing::debug!(src = %src.display(), dest = %dest.display(), "Rename failed, copying");
    if let Err(e) = fs::copy(src, dest) {
        let _ = fs::remove_file(dest);
        return Err(e.into());
    }
    let _ = fs::remove_file(src);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(n: usize) -> Vec<SourceItem> {
        (0..n)
            .map(|i| SourceItem::material(format!("/m/{i}.mp4"), MaterialKind::Video))
            .collect()
    }

    #[test]
    fn test_reverse_wins_over_bounce() {
        let effects = EffectSet {
            reverse: true,
            bounce: true,
            ..EffectSet::default()
        };
        let plans = plan_clips(sources(5), &effects, 44100, &mut StdRng::seed_from_u64(3));
        assert!(plans.iter().all(|p| p.transform == WholeClipTransform::Reverse));
    }

    #[test]
    fn test_bounce_picks_from_bounce_pool() {
        let effects = EffectSet {
            bounce: true,
            ..EffectSet::default()
        };
        let plans = plan_clips(sources(20), &effects, 44100, &mut StdRng::seed_from_u64(9));
        assert!(plans
            .iter()
            .all(|p| WholeClipTransform::BOUNCE.contains(&p.transform)));
    }

    #[test]
    fn test_still_images_skip_transforms() {
        let effects = EffectSet {
            reverse: true,
            ..EffectSet::default()
        };
        let items = vec![SourceItem::material("/m/a.png", MaterialKind::Overlay)];
        let plans = plan_clips(items, &effects, 44100, &mut StdRng::seed_from_u64(0));
        assert_eq!(plans[0].transform, WholeClipTransform::None);
    }

    #[test]
    fn test_no_glitch_means_no_cosmetic_filter() {
        let plans = plan_clips(sources(10), &EffectSet::default(), 44100, &mut StdRng::seed_from_u64(1));
        assert!(plans.iter().all(|p| p.cosmetic.is_none()));
    }

    #[test]
    fn test_plans_are_reproducible_with_seed() {
        let effects = EffectSet {
            glitch_filters: true,
            bounce: true,
            ..EffectSet::default()
        };
        let a = plan_clips(sources(8), &effects, 44100, &mut StdRng::seed_from_u64(77));
        let b = plan_clips(sources(8), &effects, 44100, &mut StdRng::seed_from_u64(77));
        assert_eq!(a, b);
    }

    #[test]
    fn test_plan_audio_chain_reflects_effects() {
        let effects = EffectSet {
            earrape: true,
            pitch_semitones: 4,
            ..EffectSet::default()
        };
        let plans = plan_clips(sources(3), &effects, 44100, &mut StdRng::seed_from_u64(5));
        for plan in &plans {
            let chain = plan.audio_filter.as_deref().unwrap();
            assert!(chain.starts_with("aresample=44100,asetrate="));
            assert!(chain.ends_with("volume=6"));
            assert_eq!(chain.contains("tremolo"), plan.tremolo);
        }
    }

    #[test]
    fn test_output_extension_defaults_to_mp4() {
        assert_eq!(output_extension(Path::new("/out/final.MKV")), "mkv");
        assert_eq!(output_extension(Path::new("/out/final")), "mp4");
    }

    #[test]
    fn test_move_into_place_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("concat.mp4");
        std::fs::write(&src, b"video").unwrap();
        let dest = dir.path().join("nested").join("out.mp4");

        move_into_place(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"video");
    }
}
