//! pypants - BUILD file generation for Python monorepos
//!
//! This crate provides the core library functionality for pypants:
//! configuration merging, package discovery, import resolution, and
//! synthesis of Pants build targets.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities for pypants unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides builders for throwaway repository layouts.
#[cfg(test)]
pub mod test_support;

pub use core::{
    config::EffectiveConfig, errors::PypantsError, package::PackageRecord, package::TargetType,
    target::TargetDeclaration, workspace::Workspace,
};

pub use resolver::ResolvedDependencies;
