//! Test utilities for pypants unit tests.
//!
//! Provides a builder for throwaway repository layouts on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! let repo = RepoFixture::new()
//!     .project_config("[project]\ntop_dirs = [\"lib\"]\n")
//!     .package("lib/foo", &[("__init__.py", "import bar\n")])
//!     .build();
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::config::CONFIG_FILE_NAME;

/// Builder for a repository layout in a temporary directory.
#[derive(Debug, Clone, Default)]
pub struct RepoFixture {
    files: Vec<(PathBuf, String)>,
}

impl RepoFixture {
    /// Create an empty fixture.
    pub fn new() -> Self {
        RepoFixture::default()
    }

    /// Add a file (path relative to the repository root).
    pub fn file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.files.push((path.as_ref().to_path_buf(), content.into()));
        self
    }

    /// Add the repository-level `.pypants.cfg`.
    pub fn project_config(self, content: impl Into<String>) -> Self {
        self.file(CONFIG_FILE_NAME, content)
    }

    /// Add a package directory with an `__init__.py` and the given modules.
    pub fn package(mut self, dir: impl AsRef<Path>, modules: &[(&str, &str)]) -> Self {
        let dir = dir.as_ref();
        if !modules.iter().any(|(name, _)| *name == "__init__.py") {
            self = self.file(dir.join("__init__.py"), "");
        }
        for (name, content) in modules {
            self = self.file(dir.join(name), *content);
        }
        self
    }

    /// Add a package directory's `.pypants.cfg`.
    pub fn package_config(self, dir: impl AsRef<Path>, content: impl Into<String>) -> Self {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        self.file(path, content)
    }

    /// Add the third-party import map at its default location.
    pub fn import_map(self, json: impl Into<String>) -> Self {
        self.file("3rdparty/python/import-map.json", json)
    }

    /// Add the requirements file at its default location.
    pub fn requirements(self, content: impl Into<String>) -> Self {
        self.file("3rdparty/python/requirements.txt", content)
    }

    /// Write everything to a fresh temporary directory.
    pub fn build(self) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (path, content) in &self.files {
            let full = tmp.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&full, content).unwrap();
        }
        tmp
    }
}

/// The repository layout used by most pipeline tests: `foo` imports the
/// internal package `bar` (rooted at `foo/bar`) and the third-party module
/// `requests`.
pub fn sample_repo() -> RepoFixture {
    RepoFixture::new()
        .import_map(r#"{"requests": "//3rdparty/python:requests", "yaml": "//3rdparty/python:PyYAML"}"#)
        .requirements("requests==2.31.0\nPyYAML>=6\n")
        .package("lib/foo", &[("__init__.py", "import bar\nimport requests\n")])
        .package("foo/bar", &[("__init__.py", "")])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_files() {
        let repo = RepoFixture::new()
            .package("lib/foo", &[("mod.py", "x = 1\n")])
            .package_config("lib/foo", "[package]\n")
            .build();

        assert!(repo.path().join("lib/foo/__init__.py").is_file());
        assert!(repo.path().join("lib/foo/mod.py").is_file());
        assert!(repo.path().join("lib/foo/.pypants.cfg").is_file());
    }
}
