//! Repository root discovery.

use std::path::{Path, PathBuf};

use git2::Repository;

/// Find the root of the repository containing `start`.
///
/// Uses the working directory of the enclosing git repository. Outside of a
/// repository (or in a bare one) `start` itself is the root.
pub fn find_repo_root(start: &Path) -> PathBuf {
    match Repository::discover(start) {
        Ok(repo) => match repo.workdir() {
            Some(workdir) => {
                tracing::debug!("repository root is {}", workdir.display());
                workdir.to_path_buf()
            }
            None => {
                tracing::debug!("bare repository at {}, using {}", repo.path().display(), start.display());
                start.to_path_buf()
            }
        },
        Err(e) => {
            tracing::debug!("not in a git repository ({}), using {}", e.message(), start.display());
            start.to_path_buf()
        }
    }
}
