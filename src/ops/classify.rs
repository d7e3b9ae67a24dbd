//! Package type classification.
//!
//! An explicit `type` in the package configuration always wins. Otherwise
//! the package root is probed, in priority order:
//! 1. `__main__.py` at the root: binary
//! 2. a test naming convention at the root (the directory itself is named
//!    like a test package, or it holds a `conftest.py`): test
//! 3. anything else: library
//!
//! Only the package root is inspected. A library carrying a nested `tests/`
//! directory is still a library.
//!
//! An explicit `type` must name one of the three kinds (`library`, `binary`,
//! `test` or their short forms). Any other value fails the package with a
//! classification error rather than producing a target kind Pants has no
//! rule for.
//!
//! Package discovery runs the same inference so that dependency labels name
//! the base target each package actually declares.

use std::path::Path;

use crate::core::config::EffectiveConfig;
use crate::core::errors::PypantsError;
use crate::core::package::{PackageRecord, TargetType};

/// Entry script that makes a package runnable with `python -m`.
pub const ENTRY_SCRIPT: &str = "__main__.py";

/// pytest's per-directory fixture module.
const CONFTEST: &str = "conftest.py";

/// Decide the target type of `package`.
///
/// Reads the filesystem but never writes to it.
pub fn classify(package: &PackageRecord, config: &EffectiveConfig) -> Result<TargetType, PypantsError> {
    if let Some(explicit) = config.package_type.as_deref() {
        return explicit
            .parse::<TargetType>()
            .map_err(|reason| PypantsError::classification(package.name(), reason));
    }

    let ty = infer_type(package.name(), package.root())
        .map_err(|reason| PypantsError::classification(package.name(), reason))?;

    tracing::debug!("classified {} as {}", package.name(), ty);
    Ok(ty)
}

/// Type implied by the layout of the package rooted at `root`.
pub fn infer_type(name: &str, root: &Path) -> Result<TargetType, String> {
    let is_binary = root.join(ENTRY_SCRIPT).is_file();
    let is_test = is_test_name(name) || root.join(CONFTEST).is_file();

    match (is_binary, is_test) {
        (true, true) => Err(format!(
            "it has both a `{}` entry script and a test layout",
            ENTRY_SCRIPT
        )),
        (true, false) => Ok(TargetType::Binary),
        (false, true) => Ok(TargetType::Test),
        (false, false) => Ok(TargetType::Library),
    }
}

/// Directory names reserved for test packages.
fn is_test_name(name: &str) -> bool {
    name == "tests"
        || name == "test"
        || name.starts_with("test_")
        || name.ends_with("_test")
        || name.ends_with("_tests")
}
