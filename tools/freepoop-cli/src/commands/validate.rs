//! Validate a FreePoop project file.

use std::path::PathBuf;

use freepoop_project_model::ProjectConfig;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    let project =
        ProjectConfig::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    println!("  Name: {}", project.name);
    println!("  Version: {}", project.version);
    println!("  Materials: {}", project.materials.len());
    println!("  Extras: {}", project.extras.len());

    let mut issues = Vec::new();
    if let Err(e) = project.validate() {
        issues.push(e.to_string());
    }
    if !project.has_inputs() {
        issues.push("no materials or extra references; a render would have no sources".to_string());
    }
    issues.extend(project.missing_materials());

    if issues.is_empty() {
        println!("  Sources: All present");
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Project may not render as expected.",
            issues.len()
        );
    }

    Ok(())
}
