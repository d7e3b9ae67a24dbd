//! Command implementations

pub mod completions;
pub mod generate;
pub mod graph;
pub mod list;
pub mod resolve;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::cli::GlobalArgs;
use pypants::core::{PypantsError, Workspace};
use pypants::util::diagnostic::emit;
use pypants::util::git::find_repo_root;
use pypants::util::Shell;

/// Build the shell for a command from the global flags.
pub fn shell(global: &GlobalArgs) -> Shell {
    Shell::from_flags(global.quiet, global.verbose, global.no_color)
}

/// Repository root: `--root`, else the enclosing git checkout, else the cwd.
pub fn repo_root(global: &GlobalArgs) -> Result<PathBuf> {
    if let Some(root) = &global.root {
        if !root.is_dir() {
            bail!("repository root `{}` is not a directory", root.display());
        }
        return Ok(root.clone());
    }
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(find_repo_root(&cwd))
}

/// Load the workspace, reporting run-fatal errors in full.
pub fn load_workspace(global: &GlobalArgs, shell: &Shell) -> Result<Workspace> {
    let root = repo_root(global)?;
    match Workspace::load(&root) {
        Ok(ws) => Ok(ws),
        Err(PypantsError::DuplicatePackage(dup)) => {
            eprintln!("{:?}", miette::Report::new(dup));
            bail!("package index for {} is invalid", root.display())
        }
        Err(err) => {
            emit(&err.to_diagnostic(), shell.use_color());
            bail!("could not load repository at {}", root.display())
        }
    }
}
