//! Error types shared across FreePoop crates.

use std::path::PathBuf;

/// Top-level error type for FreePoop operations.
#[derive(Debug, thiserror::Error)]
pub enum FreepoopError {
    /// Source resolution produced nothing to render.
    #[error("No sources available for render")]
    NoSources,

    /// A single remote reference could not be materialized.
    #[error("Fetch failed for {reference}: {message}")]
    Fetch { reference: String, message: String },

    /// An external media tool could not be started or exited non-zero.
    #[error("{step} failed ({status}): {stderr}")]
    ExternalTool {
        step: String,
        status: String,
        stderr: String,
    },

    /// Workspace removal failed. Logged, never surfaced from a render.
    #[error("Failed to clean up workspace {path}: {message}")]
    Cleanup { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Project error: {message}")]
    Project { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FreepoopError.
pub type FreepoopResult<T> = Result<T, FreepoopError>;

impl FreepoopError {
    pub fn fetch(reference: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            reference: reference.into(),
            message: msg.into(),
        }
    }

    pub fn external_tool(
        step: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ExternalTool {
            step: step.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project {
            message: msg.into(),
        }
    }

    /// Whether the pipeline may continue past this error.
    ///
    /// Only per-reference fetch failures are recoverable; everything else
    /// aborts the render.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}
