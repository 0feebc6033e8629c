//! FreePoop Render Engine
//!
//! Turns a declarative [`ProjectConfig`](freepoop_project_model::ProjectConfig)
//! into a sequence of external media-tool invocations that produce one
//! playable file.
//!
//! # Pipeline Architecture
//!
//! ```text
//! videos + gifs ──┐
//! other materials ├── Resolve ── Order ──┐
//! extras (fetch) ─┘ (scramble → truncate → stutter)
//!                                        │
//!             per clip: Transform (reverse / bounce)
//!                                        │
//!                       Normalize (probe → one video + one audio stream)
//!                                        │
//!                     Concatenate (stream-matching filter graph)
//!                                        │
//!                           Tint overlay (optional)
//!                                        │
//!                                        ▼
//!                                  output file
//! ```
//!
//! Every intermediate lives in a per-invocation [`Workspace`](workspace::Workspace)
//! that is removed when the invocation ends.

pub mod assemble;
pub mod encode;
pub mod fetch;
pub mod filters;
pub mod normalize;
pub mod ordering;
pub mod pipeline;
pub mod preview;
pub mod probe;
pub mod toolchain;
pub mod transform;
pub mod workspace;

pub use pipeline::*;
