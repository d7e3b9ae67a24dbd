//! Import resolution.
//!
//! Scans a package's sources and sorts every imported module into one of
//! three buckets:
//! - internal: another package of the repository
//! - third-party: found in the import map
//! - unresolved: neither (diagnostic only)
//!
//! Relative imports, imports of the package itself, and standard-library
//! imports contribute nothing.

pub mod scan;
pub mod stdlib;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::config::EffectiveConfig;
use crate::core::errors::PypantsError;
use crate::core::import_map::ImportMapIndex;
use crate::core::package::PackageRecord;
use crate::core::package_index::PackageIndex;
use crate::util::fs::python_files;

pub use scan::ImportRef;

/// Resolved dependencies of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedDependencies {
    /// Labels of other in-repo packages
    pub internal: BTreeSet<String>,

    /// Labels of third-party targets
    pub third_party: BTreeSet<String>,

    /// Top-level import names that matched nothing
    pub unresolved: BTreeSet<String>,
}

impl ResolvedDependencies {
    /// Every dependency label, internal and third-party.
    pub fn labels(&self) -> impl Iterator<Item = &String> {
        self.internal.iter().chain(self.third_party.iter())
    }
}

/// Result of resolving one package: its dependencies plus the files that
/// could not be parsed.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub dependencies: ResolvedDependencies,
    pub source_errors: Vec<PypantsError>,
}

/// Scan `package` and resolve its imports against the shared indices.
///
/// Pure with respect to its inputs: running it twice over an unchanged tree
/// yields identical results.
pub fn resolve_imports(
    package: &PackageRecord,
    index: &PackageIndex,
    import_map: &ImportMapIndex,
    config: &EffectiveConfig,
) -> ImportReport {
    let mut report = ImportReport::default();
    let mut imports: BTreeSet<ImportRef> = BTreeSet::new();

    for file in python_files(package.root(), package.root(), &config.ignore_dirs) {
        match scan::scan_file(&file) {
            Ok(found) => imports.extend(found),
            Err(err) => {
                tracing::warn!("{}", err);
                report.source_errors.push(err);
            }
        }
    }

    let deps = &mut report.dependencies;
    for import in &imports {
        // Relative imports never leave the package
        let (ImportRef::Absolute(module), Some(top)) = (import, import.top_level()) else {
            continue;
        };
        if top == package.name() {
            continue;
        }

        if let Some(other) = index.lookup(top) {
            deps.internal.insert(other.dependency_label());
        } else if let Some(label) = import_map.resolve(module) {
            deps.third_party.insert(label.to_string());
        } else if !stdlib::is_stdlib(top) {
            deps.unresolved.insert(top.to_string());
        }
    }

    let third_party_prefix = config.third_party_label_prefix();
    for dep in &config.extra_dependencies {
        let label = normalize_label(dep);
        if is_under(&label, &third_party_prefix) {
            deps.third_party.insert(label);
        } else {
            deps.internal.insert(label);
        }
    }

    tracing::debug!(
        "{}: {} internal, {} third-party, {} unresolved",
        package.name(),
        deps.internal.len(),
        deps.third_party.len(),
        deps.unresolved.len()
    );

    report
}

/// Turn an operator-written dependency into a label.
///
/// Labels (`//a/b:c`, `:c`) pass through untouched; a bare repository path
/// such as `lib/python_core/src` names that directory's `lib` target.
pub fn normalize_label(dep: &str) -> String {
    let dep = dep.trim();
    if dep.starts_with("//") || dep.starts_with(':') {
        return dep.to_string();
    }
    let path = dep.trim_start_matches("./").trim_end_matches('/');
    if path.contains(':') {
        format!("//{}", path)
    } else {
        format!("//{}:lib", path)
    }
}

fn is_under(label: &str, prefix: &str) -> bool {
    match label.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(':') || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::TargetType;
    use crate::core::workspace::Workspace;
    use crate::test_support::{sample_repo, RepoFixture};

    fn resolve_in(ws: &Workspace, name: &str) -> ImportReport {
        let package = ws.package(name).unwrap();
        let config = ws.effective_config(package).unwrap();
        resolve_imports(package, ws.index(), ws.import_map(), &config)
    }

    #[test]
    fn test_internal_and_third_party_imports() {
        let repo = sample_repo().build();
        let ws = Workspace::load(repo.path()).unwrap();

        let report = resolve_in(&ws, "foo");
        let deps = &report.dependencies;
        assert_eq!(deps.internal, BTreeSet::from(["//foo/bar:lib".to_string()]));
        assert_eq!(
            deps.third_party,
            BTreeSet::from(["//3rdparty/python:requests".to_string()])
        );
        assert!(deps.unresolved.is_empty());
        assert!(report.source_errors.is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let repo = sample_repo()
            .package("lib/baz", &[("x.py", "import foo\nimport yaml\nimport missing_mod\n")])
            .build();
        let ws = Workspace::load(repo.path()).unwrap();

        let first = resolve_in(&ws, "baz").dependencies;
        let second = resolve_in(&ws, "baz").dependencies;
        assert_eq!(first, second);
        assert_eq!(first.unresolved, BTreeSet::from(["missing_mod".to_string()]));
    }

    #[test]
    fn test_relative_self_and_stdlib_imports_contribute_nothing() {
        let repo = RepoFixture::new()
            .package(
                "lib/app",
                &[
                    ("__init__.py", "from . import util\nfrom .models import User\n"),
                    ("util.py", "import os, sys, json\nimport app.models\nfrom app import util\n"),
                    ("models.py", "from __future__ import annotations\nimport typing\n"),
                ],
            )
            .build();
        let ws = Workspace::load(repo.path()).unwrap();

        let deps = resolve_in(&ws, "app").dependencies;
        assert_eq!(deps, ResolvedDependencies::default());
    }

    #[test]
    fn test_parse_errors_degrade_single_file() {
        let repo = sample_repo()
            .package(
                "lib/mixed",
                &[("good.py", "import requests\n"), ("bad.py", "def broken(:\n")],
            )
            .build();
        let ws = Workspace::load(repo.path()).unwrap();

        let report = resolve_in(&ws, "mixed");
        assert_eq!(report.source_errors.len(), 1);
        assert!(matches!(
            &report.source_errors[0],
            PypantsError::SourceParse { path, .. } if path.ends_with("bad.py")
        ));
        assert!(report
            .dependencies
            .third_party
            .contains("//3rdparty/python:requests"));
    }

    #[test]
    fn test_ignored_subdirectories_are_not_scanned() {
        let repo = sample_repo()
            .project_config("[project]\nignore_dirs = [\"fixtures\"]\n")
            .package("lib/svc", &[("main.py", "import bar\n")])
            .file("lib/svc/fixtures/sample.py", "import yaml\n")
            .build();
        let ws = Workspace::load(repo.path()).unwrap();

        let deps = resolve_in(&ws, "svc").dependencies;
        assert_eq!(deps.internal, BTreeSet::from(["//foo/bar:lib".to_string()]));
        assert!(deps.third_party.is_empty());
    }

    #[test]
    fn test_extra_dependencies_are_routed_and_collapsed() {
        let repo = sample_repo()
            .package_config(
                "lib/foo",
                r#"[package]
extra_dependencies = ["//foo/bar:lib", "lib/python_core/src", "//3rdparty/python:six"]
"#,
            )
            .build();
        let ws = Workspace::load(repo.path()).unwrap();

        let deps = resolve_in(&ws, "foo").dependencies;
        assert_eq!(
            deps.internal,
            BTreeSet::from([
                "//foo/bar:lib".to_string(),
                "//lib/python_core/src:lib".to_string(),
            ])
        );
        assert_eq!(
            deps.third_party,
            BTreeSet::from([
                "//3rdparty/python:requests".to_string(),
                "//3rdparty/python:six".to_string(),
            ])
        );
    }

    #[test]
    fn test_internal_label_follows_explicit_type() {
        let repo = RepoFixture::new()
            .package("apps/tool", &[])
            .package_config("apps/tool", "[package]\ntype = \"binary\"\n")
            .package("lib/user", &[("__init__.py", "from tool import cli\n")])
            .build();
        let ws = Workspace::load(repo.path()).unwrap();

        assert_eq!(ws.package("tool").unwrap().target_type(), Some(TargetType::Binary));
        let deps = resolve_in(&ws, "user").dependencies;
        assert_eq!(deps.internal, BTreeSet::from(["//apps/tool:bin".to_string()]));
    }

    #[test]
    fn test_internal_label_follows_inferred_type() {
        let repo = RepoFixture::new()
            .package("apps/cli", &[("__main__.py", "")])
            .package("lib/checks", &[("conftest.py", "")])
            .package("lib/user", &[("__init__.py", "import cli
import checks
")])
            .build();
        let ws = Workspace::load(repo.path()).unwrap();

        let deps = resolve_in(&ws, "user").dependencies;
        assert_eq!(
            deps.internal,
            BTreeSet::from(["//apps/cli:bin".to_string(), "//lib/checks:tests".to_string()])
        );
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("//a/b:c"), "//a/b:c");
        assert_eq!(normalize_label(":local"), ":local");
        assert_eq!(normalize_label("lib/python_core/src/"), "//lib/python_core/src:lib");
        assert_eq!(normalize_label("./lib/x:tests"), "//lib/x:tests");
        assert!(is_under("//3rdparty/python:six", "//3rdparty/python"));
        assert!(!is_under("//3rdparty/python2:six", "//3rdparty/python"));
    }
}
