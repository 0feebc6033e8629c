//! FreePoop Common Utilities
//!
//! Shared infrastructure for all FreePoop crates:
//! - Error taxonomy and result alias
//! - Tracing/logging initialization
//! - Configuration loading (toolchain, render defaults, fetch, logging)

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
