//! Target synthesis.
//!
//! Maps the facts gathered about one package (its type, its resolved
//! dependencies and its configuration) to the declarations of its BUILD
//! file. The mapping is deterministic: declarations always come out in the
//! order base target, local binary, pytest binary.

use crate::core::config::EffectiveConfig;
use crate::core::package::{PackageRecord, TargetType};
use crate::core::target::{TargetDeclaration, TargetKind};
use crate::resolver::ResolvedDependencies;

/// Glob covering the whole package subtree.
pub const PACKAGE_SOURCES: &str = "**/*";

/// Name of the optional local-run binary.
pub const LOCAL_BINARY_NAME: &str = "local";

/// Name of the optional pytest runner.
pub const PYTEST_BINARY_NAME: &str = "pytest";

/// Module the local binary runs, relative to the package root.
pub const LOCAL_ENTRY_MODULE: &str = "local.py";

/// Build the declarations for one package.
pub fn synthesize(
    package: &PackageRecord,
    ty: TargetType,
    deps: &ResolvedDependencies,
    config: &EffectiveConfig,
) -> Vec<TargetDeclaration> {
    if !config.generate_build_file {
        return Vec::new();
    }

    let primary = ty.target_name();
    let mut declarations = Vec::with_capacity(3);

    let mut base = TargetDeclaration::new(TargetKind::from(ty), primary)
        .with_sources([PACKAGE_SOURCES])
        .with_dependencies(deps.labels().cloned())
        .with_tags(config.extra_tags.iter().cloned())
        .with_attribute(
            "package_name",
            format!("{}{}", config.package_name_prefix, package.name()),
        );
    if let Some(tag) = implicit_tag(ty) {
        base = base.with_tags([tag]);
    }
    if ty == TargetType::Binary {
        base = base.with_attribute("entry_point", format!("{}.__main__", package.name()));
    }
    declarations.push(base);

    if config.generate_local_binary && ty == TargetType::Library {
        declarations.push(
            TargetDeclaration::new(TargetKind::Binary, LOCAL_BINARY_NAME)
                .with_sources([LOCAL_ENTRY_MODULE])
                .with_dependencies([format!(":{}", primary)])
                .with_tags(config.extra_tags.iter().cloned())
                .with_attribute("entry_point", format!("{}.local", package.name())),
        );
    }

    if config.generate_pytest_binary {
        let mut pytest = TargetDeclaration::new(TargetKind::TestBinary, PYTEST_BINARY_NAME)
            .with_dependencies(deps.labels().cloned())
            .with_dependencies([format!(":{}", primary)])
            .with_tags(config.extra_tags.iter().cloned())
            .with_tags(["tests"])
            .with_attribute("entry_point", "pytest");
        if config.include_test_coverage {
            pytest = pytest.with_attribute("coverage", vec![package.name().to_string()]);
        }
        declarations.push(pytest);
    }

    apply_ignore_targets(package, declarations, config)
}

fn implicit_tag(ty: TargetType) -> Option<&'static str> {
    match ty {
        TargetType::Library => None,
        TargetType::Binary => Some("binary"),
        TargetType::Test => Some("tests"),
    }
}

/// Drop declarations named in `ignore_targets`.
///
/// An entry matches a bare declaration name, a full label, or the package
/// name (which drops every declaration of the package).
fn apply_ignore_targets(
    package: &PackageRecord,
    declarations: Vec<TargetDeclaration>,
    config: &EffectiveConfig,
) -> Vec<TargetDeclaration> {
    let ignored = &config.ignore_targets;
    if ignored.contains(package.name()) {
        tracing::debug!("all targets of {} are ignored", package.name());
        return Vec::new();
    }

    declarations
        .into_iter()
        .filter(|decl| {
            let keep = !ignored.contains(&decl.name) && !ignored.contains(&package.label(&decl.name));
            if !keep {
                tracing::debug!("dropping ignored target {}", package.label(&decl.name));
            }
            keep
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::AttributeValue;
    use std::collections::BTreeSet;

    fn foo() -> PackageRecord {
        PackageRecord::new("foo", "/repo/lib/foo", "lib/foo")
    }

    fn deps() -> ResolvedDependencies {
        ResolvedDependencies {
            internal: BTreeSet::from(["//foo/bar:lib".to_string()]),
            third_party: BTreeSet::from(["//3rdparty/python:requests".to_string()]),
            unresolved: BTreeSet::from(["mystery".to_string()]),
        }
    }

    fn names(decls: &[TargetDeclaration]) -> Vec<&str> {
        decls.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_generate_build_file_false_yields_nothing() {
        let mut config = EffectiveConfig::default();
        config.set("generate_build_file", "false").unwrap();
        config.set("generate_pytest_binary", "true").unwrap();

        for ty in [TargetType::Library, TargetType::Binary, TargetType::Test] {
            assert!(synthesize(&foo(), ty, &deps(), &config).is_empty());
        }
    }

    #[test]
    fn test_library_base_declaration() {
        let mut config = EffectiveConfig::default();
        config.set("extra_tags", r#"["team-a"]"#).unwrap();
        config.set("python_package_name_prefix", "acme-").unwrap();

        let decls = synthesize(&foo(), TargetType::Library, &deps(), &config);
        assert_eq!(decls.len(), 1);

        let lib = &decls[0];
        assert_eq!(lib.kind, TargetKind::Library);
        assert_eq!(lib.name, "lib");
        assert_eq!(lib.source_globs, vec![PACKAGE_SOURCES]);
        assert_eq!(
            lib.dependencies,
            BTreeSet::from([
                "//3rdparty/python:requests".to_string(),
                "//foo/bar:lib".to_string(),
            ])
        );
        assert_eq!(lib.tags, BTreeSet::from(["team-a".to_string()]));
        assert_eq!(lib.attribute("package_name"), Some(&AttributeValue::from("acme-foo")));
    }

    #[test]
    fn test_binary_and_test_types() {
        let config = EffectiveConfig::default();

        let bin = &synthesize(&foo(), TargetType::Binary, &deps(), &config)[0];
        assert_eq!(bin.kind, TargetKind::Binary);
        assert_eq!(bin.name, "bin");
        assert!(bin.tags.contains("binary"));
        assert_eq!(bin.attribute("entry_point"), Some(&AttributeValue::from("foo.__main__")));

        let tests = &synthesize(&foo(), TargetType::Test, &deps(), &config)[0];
        assert_eq!(tests.kind, TargetKind::Test);
        assert_eq!(tests.name, "tests");
        assert!(tests.tags.contains("tests"));
    }

    #[test]
    fn test_library_with_local_and_pytest_binaries() {
        let mut config = EffectiveConfig::default();
        config.set("generate_local_binary", "true").unwrap();
        config.set("generate_pytest_binary", "true").unwrap();

        let decls = synthesize(&foo(), TargetType::Library, &deps(), &config);
        assert_eq!(names(&decls), vec!["lib", "local", "pytest"]);

        let local = &decls[1];
        assert_eq!(local.kind, TargetKind::Binary);
        assert_eq!(local.dependencies, BTreeSet::from([":lib".to_string()]));

        let pytest = &decls[2];
        assert_eq!(pytest.kind, TargetKind::TestBinary);
        assert!(pytest.dependencies.contains(":lib"));
        assert!(pytest.dependencies.contains("//foo/bar:lib"));
        assert_eq!(
            pytest.attribute("coverage"),
            Some(&AttributeValue::List(vec!["foo".to_string()]))
        );
    }

    #[test]
    fn test_local_binary_only_for_libraries() {
        let mut config = EffectiveConfig::default();
        config.set("generate_local_binary", "true").unwrap();

        let decls = synthesize(&foo(), TargetType::Binary, &deps(), &config);
        assert_eq!(names(&decls), vec!["bin"]);
    }

    #[test]
    fn test_pytest_without_coverage() {
        let mut config = EffectiveConfig::default();
        config.set("generate_pytest_binary", "true").unwrap();
        config.set("include_test_coverage", "false").unwrap();

        let decls = synthesize(&foo(), TargetType::Binary, &deps(), &config);
        assert_eq!(names(&decls), vec!["bin", "pytest"]);
        assert!(decls[1].dependencies.contains(":bin"));
        assert_eq!(decls[1].attribute("coverage"), None);
    }

    #[test]
    fn test_extra_dependencies_are_set_collapsed() {
        let mut resolved = deps();
        // Already discovered automatically and also declared by hand
        resolved.internal.insert("//foo/bar:lib".to_string());

        let decls = synthesize(&foo(), TargetType::Library, &resolved, &EffectiveConfig::default());
        assert_eq!(decls[0].dependencies.len(), 2);
    }

    #[test]
    fn test_ignore_targets_is_a_post_filter() {
        let mut config = EffectiveConfig::default();
        config.set("generate_local_binary", "true").unwrap();
        config.set("generate_pytest_binary", "true").unwrap();
        let unfiltered = synthesize(&foo(), TargetType::Library, &deps(), &config);

        config.set("ignore_targets", r#"["local", "//lib/foo:pytest"]"#).unwrap();
        let filtered = synthesize(&foo(), TargetType::Library, &deps(), &config);

        assert_eq!(names(&filtered), vec!["lib"]);
        assert_eq!(filtered[0], unfiltered[0]);

        config.set("ignore_targets", r#"["foo"]"#).unwrap();
        assert!(synthesize(&foo(), TargetType::Library, &deps(), &config).is_empty());
    }
}
