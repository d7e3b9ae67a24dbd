//! Shared utilities

pub mod diagnostic;
pub mod fs;
pub mod git;
pub mod shell;

pub use diagnostic::Diagnostic;
pub use shell::Shell;
