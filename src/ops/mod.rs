//! High-level operations.
//!
//! This module contains the per-package pipeline stages and the
//! implementation of the pypants commands built on top of them.

pub mod classify;
pub mod generate;
pub mod graph;
pub mod render;
pub mod synthesize;

pub use classify::classify;
pub use generate::{generate, process_package, GenerateOptions, PackageOutcome, RunReport};
pub use graph::PackageGraph;
pub use render::render_build_file;
pub use synthesize::synthesize;
