//! Per-render temporary workspace.

use std::path::{Path, PathBuf};

use freepoop_common::error::{FreepoopError, FreepoopResult};
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "freepoop_render_";

/// Exclusive, uniquely named directory owning every intermediate of one
/// render. Removed by [`Workspace::cleanup`], or on drop as a fallback.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace under `root`, or the system temp dir when `None`.
    pub fn create(root: Option<&Path>) -> FreepoopResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        tracing::debug!(path = %dir.path().display(), "Created render workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for an intermediate file named `name`.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Directory fetched references download into.
    pub fn downloads_dir(&self) -> FreepoopResult<PathBuf> {
        let dir = self.dir.path().join("downloads");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Private download directory for the `slot`-th extra reference, so two
    /// references with the same file name never share a path.
    pub fn download_slot(&self, slot: usize) -> FreepoopResult<PathBuf> {
        let dir = self.downloads_dir()?.join(format!("{slot:03}"));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Recursively remove the workspace.
    pub fn cleanup(self) -> FreepoopResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| FreepoopError::Cleanup {
            path,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(root.path())).unwrap();
        let downloads = ws.downloads_dir().unwrap();
        std::fs::write(downloads.join("a.webm"), b"x").unwrap();
        std::fs::write(ws.file("norm_000.mp4"), b"x").unwrap();

        let path = ws.path().to_path_buf();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKSPACE_PREFIX));
        ws.cleanup().unwrap();
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_workspaces_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let a = Workspace::create(Some(root.path())).unwrap();
        let b = Workspace::create(Some(root.path())).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_download_slots_are_separate_directories() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(Some(root.path())).unwrap();
        let first = ws.download_slot(0).unwrap();
        let second = ws.download_slot(1).unwrap();

        assert_ne!(first, second);
        assert!(first.is_dir() && second.is_dir());
        assert!(first.starts_with(ws.downloads_dir().unwrap()));
        assert!(first.ends_with("000"));
    }

    #[test]
    fn test_missing_root_is_created() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let ws = Workspace::create(Some(&nested)).unwrap();
        assert!(ws.path().starts_with(&nested));
    }
}
