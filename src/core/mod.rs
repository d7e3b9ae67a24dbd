//! Core data structures for pypants.
//!
//! This module contains the run-wide state and the data model:
//! - Configuration (project settings, package layers, effective config)
//! - Package records and the package index
//! - The third-party import map
//! - Target declarations
//! - The error taxonomy

pub mod config;
pub mod errors;
pub mod import_map;
pub mod package;
pub mod package_index;
pub mod target;
pub mod workspace;

pub use config::{EffectiveConfig, PackageConfig, ProjectConfig, CONFIG_FILE_NAME};
pub use errors::{DuplicatePackageError, PypantsError, UnresolvedImport};
pub use import_map::ImportMapIndex;
pub use package::{PackageRecord, TargetType};
pub use package_index::PackageIndex;
pub use target::{AttributeValue, TargetDeclaration, TargetKind};
pub use workspace::Workspace;
