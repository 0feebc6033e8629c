pub mod add;
pub mod check;
pub mod fetch;
pub mod info;
pub mod init;
pub mod preview;
pub mod remove;
pub mod render;
pub mod validate;

use std::path::Path;

use freepoop_project_model::{ProjectConfig, ProjectSession};

fn load_session(path: &Path) -> anyhow::Result<ProjectSession> {
    let config =
        ProjectConfig::load(path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    Ok(ProjectSession::from_config(config))
}

fn save_session(session: ProjectSession, path: &Path) -> anyhow::Result<()> {
    let config = session
        .build()
        .map_err(|e| anyhow::anyhow!("Refusing to save invalid project: {e}"))?;
    config
        .save(path)
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))
}
