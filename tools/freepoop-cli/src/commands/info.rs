//! Show project information.

use std::path::PathBuf;

use serde::Serialize;

use freepoop_project_model::{EffectSet, MaterialKind, ProjectConfig};

#[derive(Serialize)]
struct ProjectSummary<'a> {
    name: &'a str,
    created_at: &'a str,
    modified_at: &'a str,
    clip_count: u32,
    materials: Vec<(MaterialKind, usize)>,
    extras: usize,
    missing: Vec<String>,
    effects: &'a EffectSet,
}

pub fn run(path: PathBuf, json: bool) -> anyhow::Result<()> {
    let project =
        ProjectConfig::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    if json {
        let summary = ProjectSummary {
            name: &project.name,
            created_at: &project.created_at,
            modified_at: &project.modified_at,
            clip_count: project.clip_count,
            materials: MaterialKind::ALL
                .iter()
                .map(|k| (*k, project.materials.get(*k).len()))
                .collect(),
            extras: project.extras.len(),
            missing: project.missing_materials(),
            effects: &project.effects,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Project: {}", project.name);
    println!("  Created: {}", project.created_at);
    println!("  Modified: {}", project.modified_at);
    println!("  Clip count: {}", project.clip_count);
    println!();

    println!("Materials:");
    for kind in MaterialKind::ALL {
        let list = project.materials.get(kind);
        println!("  {kind}: {}", list.len());
        for path in list {
            println!("    {}", path.display());
        }
    }
    println!("  extras: {}", project.extras.len());
    for reference in &project.extras {
        println!("    {reference}");
    }
    println!();

    let e = &project.effects;
    println!("Effects:");
    println!("  Stutter: {}", e.stutter);
    println!("  Reverse: {}", e.reverse);
    println!("  Scramble: {}", e.scramble);
    println!("  Earrape: {}", e.earrape);
    println!("  Overlay tint: {}", e.overlay_tint);
    println!(
        "  Pitch: {} semitones (preserve speed: {})",
        e.pitch_semitones, e.preserve_speed
    );
    println!("  Glitch filters: {}", e.glitch_filters);
    println!("  Bounce: {}", e.bounce);

    Ok(())
}
