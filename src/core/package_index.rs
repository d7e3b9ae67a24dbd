//! Package discovery and the name -> package index.
//!
//! The index is built once per run, before any per-package work starts, and
//! is shared read-only by every worker afterwards.

use std::collections::btree_map::{BTreeMap, Entry};
use std::path::{Path, PathBuf};

use crate::core::config::{PackageConfig, ProjectConfig};
use crate::core::errors::DuplicatePackageError;
use crate::core::package::{PackageRecord, TargetType};
use crate::ops::classify::infer_type;
use crate::util::fs::{relative_path, to_slash, walk};

/// Marker file of an importable package.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// All internal packages of a repository, keyed by importable name.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    packages: BTreeMap<String, PackageRecord>,
}

impl PackageIndex {
    /// Walk the configured top directories and index every top-level package.
    pub fn discover(repo_root: &Path, project: &ProjectConfig) -> Result<Self, DuplicatePackageError> {
        let mut index = PackageIndex::default();

        for top in &project.top_dirs {
            let top_dir = if top == "." {
                repo_root.to_path_buf()
            } else {
                repo_root.join(top)
            };
            if !top_dir.is_dir() {
                tracing::warn!("top directory `{}` does not exist, skipping", top);
                continue;
            }

            let mut roots: Vec<PathBuf> = Vec::new();
            for entry in walk(&top_dir, repo_root, &project.ignore_dirs) {
                if !entry.file_type().is_dir() || !entry.path().join(PACKAGE_MARKER).is_file() {
                    continue;
                }
                let path = entry.path();
                if roots.iter().any(|root| path.starts_with(root)) {
                    // Subpackage of an already indexed package
                    continue;
                }
                let parent_is_package = path
                    .parent()
                    .map(|p| p.join(PACKAGE_MARKER).is_file())
                    .unwrap_or(false);
                if parent_is_package && path != top_dir {
                    continue;
                }

                roots.push(path.to_path_buf());
                let record = make_record(repo_root, path, project);
                index.insert(record)?;
            }
        }

        tracing::debug!("discovered {} packages", index.len());
        Ok(index)
    }

    fn insert(&mut self, record: PackageRecord) -> Result<(), DuplicatePackageError> {
        match self.packages.entry(record.name().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
            // Same directory reached through overlapping top dirs
            Entry::Occupied(existing) if existing.get().root() == record.root() => Ok(()),
            Entry::Occupied(existing) => Err(DuplicatePackageError {
                name: record.name().to_string(),
                first: existing.get().root().to_path_buf(),
                second: record.root().to_path_buf(),
            }),
        }
    }

    /// Look up a package by importable name.
    pub fn lookup(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.get(name)
    }

    /// Packages in name order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageRecord> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

fn make_record(repo_root: &Path, path: &Path, project: &ProjectConfig) -> PackageRecord {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let rel_root = to_slash(&relative_path(repo_root, path));

    // Only the dependency label depends on this; a broken package config or
    // an ambiguous layout is reported when that package itself is processed.
    let configured = PackageConfig::load(path).ok().and_then(|own| {
        let mut layer = project.package_defaults.clone();
        layer.merge(own);
        layer.package_type
    });
    let target_type = match configured {
        Some(explicit) => explicit.parse::<TargetType>().ok(),
        None => infer_type(&name, path).ok(),
    };

    PackageRecord::new(name, path, rel_root).with_target_type(target_type)
}
