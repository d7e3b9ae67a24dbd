//! Error taxonomy for a generation run.
//!
//! Errors differ in blast radius:
//! - [`PypantsError::ConfigParse`] and [`PypantsError::Classification`] abort
//!   one package.
//! - [`PypantsError::SourceParse`] drops one file's imports.
//! - [`PypantsError::DuplicatePackage`] aborts the whole run.
//!
//! Unresolved imports are not errors at all; they are collected as
//! [`UnresolvedImport`] warnings and reported at the end of the run.

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error raised while generating targets.
#[derive(Debug, Clone, Error)]
pub enum PypantsError {
    #[error("invalid value for `{field}` in {}: {message}", .path.display())]
    ConfigParse {
        field: String,
        path: PathBuf,
        message: String,
    },

    #[error(transparent)]
    DuplicatePackage(#[from] DuplicatePackageError),

    #[error("cannot classify package `{package}`: {reason}")]
    Classification { package: String, reason: String },

    #[error("failed to parse {}: {message}", .path.display())]
    SourceParse { path: PathBuf, message: String },
}

impl PypantsError {
    pub fn config_parse(
        field: impl Into<String>,
        path: &Path,
        message: impl Into<String>,
    ) -> Self {
        PypantsError::ConfigParse {
            field: field.into(),
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn classification(package: impl Into<String>, reason: impl Into<String>) -> Self {
        PypantsError::Classification {
            package: package.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error invalidates the whole run rather than one package.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, PypantsError::DuplicatePackage(_))
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            PypantsError::ConfigParse {
                field,
                path,
                message,
            } => {
                let diag = Diagnostic::error(format!("invalid value for `{}`", field))
                    .with_location(path)
                    .with_context(message.clone());
                if message.contains("boolean") {
                    diag.with_suggestion(suggestions::CONFIG_BOOL)
                } else if message.contains("list") || message.contains("JSON") {
                    diag.with_suggestion(suggestions::CONFIG_LIST)
                } else {
                    diag
                }
            }

            PypantsError::DuplicatePackage(err) => Diagnostic::error(format!(
                "duplicate package name `{}`",
                err.name
            ))
            .with_context(format!("first found at {}", err.first.display()))
            .with_context(format!("also found at {}", err.second.display()))
            .with_suggestion(suggestions::DUPLICATE_PACKAGE),

            PypantsError::Classification { package, reason } => {
                Diagnostic::error(format!("cannot classify package `{}`", package))
                    .with_context(reason.clone())
                    .with_suggestion(suggestions::SET_PACKAGE_TYPE)
            }

            PypantsError::SourceParse { path, message } => {
                Diagnostic::warning("source file skipped: syntax error")
                    .with_location(path)
                    .with_context(message.clone())
            }
        }
    }
}

/// Two discovered packages share the same importable name.
#[derive(Debug, Clone, Error, MietteDiagnostic)]
#[error("duplicate package name `{name}` ({} and {})", .first.display(), .second.display())]
#[diagnostic(
    code(pypants::index::duplicate_package),
    help("Rename one of the packages or add its parent directory to `ignore_dirs`")
)]
pub struct DuplicatePackageError {
    pub name: String,
    pub first: PathBuf,
    pub second: PathBuf,
}

/// An import that matched neither an internal package nor the import map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnresolvedImport {
    pub package: String,
    pub import: String,
}

impl UnresolvedImport {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(format!(
            "unresolved import `{}` in package `{}`",
            self.import, self.package
        ))
        .with_suggestion(suggestions::UNRESOLVED_IMPORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_package_diagnostic() {
        let err = PypantsError::from(DuplicatePackageError {
            name: "core".to_string(),
            first: PathBuf::from("lib/a/core"),
            second: PathBuf::from("lib/b/core"),
        });

        assert!(err.is_run_fatal());
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("duplicate package name `core`"));
        assert!(output.contains("lib/a/core"));
        assert!(output.contains("lib/b/core"));
    }

    #[test]
    fn test_config_parse_names_field_and_file() {
        let err = PypantsError::config_parse(
            "generate_build_file",
            Path::new("pkg/.pypants.cfg"),
            "expected a boolean, found \"maybe\"",
        );

        assert!(!err.is_run_fatal());
        let message = err.to_string();
        assert!(message.contains("generate_build_file"));
        assert!(message.contains("pkg/.pypants.cfg"));
        assert!(err.to_diagnostic().format(false).contains("true, false"));
    }

    #[test]
    fn test_source_parse_is_a_warning() {
        let err = PypantsError::SourceParse {
            path: PathBuf::from("pkg/foo/bad.py"),
            message: "syntax error at line 3".to_string(),
        };
        assert!(!err.to_diagnostic().is_error());
    }
}
