//! Add materials and extra references.

use std::path::PathBuf;

use freepoop_project_model::MaterialKind;

use super::{load_session, save_session};

pub fn run(project: PathBuf, kind: MaterialKind, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let mut session = load_session(&project)?;

    for path in paths {
        // Store absolute paths so the project renders from any directory.
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        if !path.exists() {
            println!("  [WARN] {} does not exist (added anyway)", path.display());
        }
        session.add(kind, path);
    }

    let list = session.config().materials.get(kind).clone();
    save_session(session, &project)?;

    println!("{kind} materials ({}):", list.len());
    for (i, path) in list.iter().enumerate() {
        println!("  [{i}] {}", path.display());
    }
    Ok(())
}

pub fn run_extra(project: PathBuf, references: Vec<String>) -> anyhow::Result<()> {
    let mut session = load_session(&project)?;
    for reference in references {
        session.add_extra(reference);
    }

    let extras = session.config().extras.clone();
    save_session(session, &project)?;

    println!("Extra references ({}):", extras.len());
    for (i, reference) in extras.iter().enumerate() {
        println!("  [{i}] {reference}");
    }
    Ok(())
}
