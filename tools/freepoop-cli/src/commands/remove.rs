//! Remove materials and extra references.

use std::path::PathBuf;

use freepoop_project_model::MaterialKind;

use super::{load_session, save_session};

pub fn run(project: PathBuf, kind: MaterialKind, index: usize) -> anyhow::Result<()> {
    let mut session = load_session(&project)?;
    let remaining = session
        .remove(kind, index)
        .map_err(|e| anyhow::anyhow!("{e}"))?
        .to_vec();
    save_session(session, &project)?;

    println!("Removed {kind} #{index}. Remaining: {}", remaining.len());
    for (i, path) in remaining.iter().enumerate() {
        println!("  [{i}] {}", path.display());
    }
    Ok(())
}

pub fn run_extra(project: PathBuf, index: usize) -> anyhow::Result<()> {
    let mut session = load_session(&project)?;
    let remaining = session
        .remove_extra(index)
        .map_err(|e| anyhow::anyhow!("{e}"))?
        .to_vec();
    save_session(session, &project)?;

    println!("Removed extra #{index}. Remaining: {}", remaining.len());
    for (i, reference) in remaining.iter().enumerate() {
        println!("  [{i}] {reference}");
    }
    Ok(())
}
