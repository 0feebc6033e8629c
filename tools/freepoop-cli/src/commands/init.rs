//! Create a new FreePoop project file.

use std::path::PathBuf;

use freepoop_project_model::ProjectConfig;

pub fn run(path: PathBuf, name: Option<String>, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }

    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    });
    println!("Creating project '{}' at {}", name, path.display());

    let project = ProjectConfig::new(&name);
    project
        .save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project created successfully:");
    println!("  Clip count: {}", project.clip_count);
    println!();
    println!("Next steps:");
    println!("  freepoop add {} video <files...>", path.display());
    println!("  freepoop add-extra {} <url>", path.display());
    println!("  freepoop render {} -o output.mp4", path.display());

    Ok(())
}
