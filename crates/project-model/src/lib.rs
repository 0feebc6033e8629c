//! FreePoop Project Model
//!
//! Defines the core data contracts for a render:
//! - **Project:** categorized materials, extra references, clip ceiling, effects
//! - **Session:** an editable project with add/remove operations
//! - **Plan:** resolved sources and per-clip render decisions
//!
//! A [`ProjectConfig`] is immutable input to one render invocation; the
//! render engine never writes back to it.

pub mod plan;
pub mod project;
pub mod session;

pub use plan::*;
pub use project::*;
pub use session::*;
