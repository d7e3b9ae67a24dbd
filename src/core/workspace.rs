//! Workspace - the repository and its run-wide, read-only state.
//!
//! A Workspace bundles the repository root, the project configuration, the
//! package index, and the third-party import map. All of it is built once,
//! up front; the per-package phase only ever borrows it immutably.

use std::path::{Path, PathBuf};

use crate::core::config::{self, EffectiveConfig, ProjectConfig};
use crate::core::errors::PypantsError;
use crate::core::import_map::ImportMapIndex;
use crate::core::package::PackageRecord;
use crate::core::package_index::PackageIndex;

/// A repository ready for per-package processing.
#[derive(Debug)]
pub struct Workspace {
    /// Repository root
    root: PathBuf,

    /// Settings from the root `.pypants.cfg`
    project: ProjectConfig,

    /// Every internal package
    index: PackageIndex,

    /// Third-party import map
    import_map: ImportMapIndex,
}

impl Workspace {
    /// Load configuration and build the shared indices.
    ///
    /// Fails on a malformed root config or duplicate package names; both
    /// invalidate every package of the run.
    pub fn load(root: &Path) -> Result<Self, PypantsError> {
        let project = ProjectConfig::load(root)?;
        let index = PackageIndex::discover(root, &project)?;
        let import_map = ImportMapIndex::load(
            &root.join(&project.third_party_import_map_path),
            &root.join(&project.third_party_requirements_path),
        );

        tracing::info!(
            "found {} packages and {} third-party mappings",
            index.len(),
            import_map.len()
        );

        Ok(Workspace {
            root: root.to_path_buf(),
            project,
            index,
            import_map,
        })
    }

    /// Get the repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    pub fn import_map(&self) -> &ImportMapIndex {
        &self.import_map
    }

    /// Look up a package by importable name.
    pub fn package(&self, name: &str) -> Option<&PackageRecord> {
        self.index.lookup(name)
    }

    /// Effective configuration of one package.
    pub fn effective_config(&self, package: &PackageRecord) -> Result<EffectiveConfig, PypantsError> {
        config::resolve(&self.project, package.root())
    }
}
