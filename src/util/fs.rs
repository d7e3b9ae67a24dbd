//! Filesystem utilities.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::{DirEntry, WalkDir};

/// Directory names that are never Python source trees.
const ALWAYS_SKIPPED: &[&str] = &["__pycache__", "node_modules"];

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a relative path with `/` separators, `.` for the empty path.
pub fn to_slash(path: &Path) -> String {
    let parts: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Whether any component of `path` equals an entry of `ignore_dirs`.
pub fn is_ignored(path: &Path, ignore_dirs: &BTreeSet<String>) -> bool {
    if ignore_dirs.is_empty() {
        return false;
    }
    path.components().any(|c| match c {
        Component::Normal(s) => ignore_dirs.contains(&*s.to_string_lossy()),
        _ => false,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Walk `root` yielding directories and files, skipping hidden entries,
/// well-known non-source directories, and anything under `ignore_dirs`
/// (matched on components relative to `base`).
pub fn walk<'a>(
    root: &Path,
    base: &'a Path,
    ignore_dirs: &'a BTreeSet<String>,
) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            if is_hidden(entry) {
                return false;
            }
            if entry.depth() > 0 && entry.file_type().is_dir() {
                let name = entry.file_name().to_string_lossy();
                if ALWAYS_SKIPPED.contains(&&*name) {
                    return false;
                }
            }
            !is_ignored(&relative_path(base, entry.path()), ignore_dirs)
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable path: {}", e);
                None
            }
        })
}

/// All `.py` files under `root`, sorted.
pub fn python_files(root: &Path, base: &Path, ignore_dirs: &BTreeSet<String>) -> Vec<PathBuf> {
    walk(root, base, ignore_dirs)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "py").unwrap_or(false))
        .map(|e| e.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_ignored_matches_whole_components() {
        let ignore = BTreeSet::from(["vendor".to_string()]);
        assert!(is_ignored(Path::new("lib/vendor/pkg"), &ignore));
        assert!(!is_ignored(Path::new("lib/vendors/pkg"), &ignore));
        assert!(!is_ignored(Path::new("lib/pkg"), &BTreeSet::new()));
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("")), ".");
        assert_eq!(to_slash(Path::new("./foo/bar")), "foo/bar");
    }

    #[test]
    fn test_python_files_skips_ignored_and_hidden() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for rel in [
            "pkg/__init__.py",
            "pkg/mod.py",
            "pkg/vendor/x.py",
            "pkg/.cache/y.py",
            "pkg/__pycache__/z.py",
            "pkg/readme.txt",
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }

        let ignore = BTreeSet::from(["vendor".to_string()]);
        let files = python_files(&root.join("pkg"), root, &ignore);
        let names: Vec<_> = files
            .iter()
            .map(|p| to_slash(&relative_path(root, p)))
            .collect();
        assert_eq!(names, vec!["pkg/__init__.py", "pkg/mod.py"]);
    }
}
