//! Package records - one per discovered Python package.
//!
//! A package is a top-level importable directory (it contains `__init__.py`
//! and its parent does not). Its name is the directory name, which is also
//! the first segment of every import that refers to it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of package, which decides the base target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Importable library
    #[serde(alias = "lib")]
    Library,

    /// Runnable entry point
    #[serde(alias = "bin")]
    Binary,

    /// Test-only package
    #[serde(alias = "tests")]
    Test,
}

impl TargetType {
    /// Name of the package's primary target.
    pub fn target_name(&self) -> &'static str {
        match self {
            TargetType::Library => "lib",
            TargetType::Binary => "bin",
            TargetType::Test => "tests",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Library => "library",
            TargetType::Binary => "binary",
            TargetType::Test => "test",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "library" | "lib" => Ok(TargetType::Library),
            "binary" | "bin" => Ok(TargetType::Binary),
            "test" | "tests" => Ok(TargetType::Test),
            other => Err(format!(
                "unknown package type `{}` (expected library, binary or test)",
                other
            )),
        }
    }
}

/// A discovered internal package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRecord {
    /// Importable name
    name: String,

    /// Absolute directory of the package
    root: PathBuf,

    /// Root relative to the repository root, `/`-separated
    rel_root: String,

    /// Type decided at discovery: the configured one, else the one implied by
    /// the package layout. `None` when neither could be settled.
    target_type: Option<TargetType>,
}

impl PackageRecord {
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        rel_root: impl Into<String>,
    ) -> Self {
        PackageRecord {
            name: name.into(),
            root: root.into(),
            rel_root: rel_root.into(),
            target_type: None,
        }
    }

    /// Attach the type settled at discovery.
    pub fn with_target_type(mut self, ty: Option<TargetType>) -> Self {
        self.target_type = ty;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository-relative directory (`.` for a package at the root).
    pub fn rel_root(&self) -> &str {
        &self.rel_root
    }

    pub fn target_type(&self) -> Option<TargetType> {
        self.target_type
    }

    /// Label of one of this package's targets.
    pub fn label(&self, target: &str) -> String {
        if self.rel_root == "." || self.rel_root.is_empty() {
            format!("//:{}", target)
        } else {
            format!("//{}:{}", self.rel_root, target)
        }
    }

    /// Label other packages use to depend on this one.
    ///
    /// Names the same base target the package's own BUILD file declares.
    pub fn dependency_label(&self) -> String {
        let ty = self.target_type.unwrap_or(TargetType::Library);
        self.label(ty.target_name())
    }

    /// Path of the BUILD file generated for this package.
    pub fn build_file_path(&self) -> PathBuf {
        self.root.join("BUILD")
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.rel_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_type_parse() {
        assert_eq!("library".parse::<TargetType>(), Ok(TargetType::Library));
        assert_eq!(" Binary ".parse::<TargetType>(), Ok(TargetType::Binary));
        assert_eq!("tests".parse::<TargetType>(), Ok(TargetType::Test));
        assert!("service".parse::<TargetType>().is_err());
    }

    #[test]
    fn test_dependency_label() {
        let bar = PackageRecord::new("bar", "/repo/foo/bar", "foo/bar");
        assert_eq!(bar.dependency_label(), "//foo/bar:lib");

        let tool = PackageRecord::new("tool", "/repo/apps/tool", "apps/tool")
            .with_target_type(Some(TargetType::Binary));
        assert_eq!(tool.dependency_label(), "//apps/tool:bin");
        assert_eq!(tool.label("pytest"), "//apps/tool:pytest");

        let top = PackageRecord::new("top", "/repo", ".");
        assert_eq!(top.label("lib"), "//:lib");
    }
}
