//! Target declarations - what gets written to a BUILD file.
//!
//! A [`TargetDeclaration`] is plain data. It is synthesized fresh on every
//! run, handed to the renderer, and never persisted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::package::TargetType;

/// The kind of target being declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Importable library (`python_library`)
    Library,

    /// Runnable entry point (`python_binary`)
    Binary,

    /// Test sources (`python_tests`)
    Test,

    /// pytest runner over the package (`python_binary` with the pytest entry point)
    TestBinary,
}

impl TargetKind {
    /// The Pants target function for this kind.
    pub fn pants_function(&self) -> &'static str {
        match self {
            TargetKind::Library => "python_library",
            TargetKind::Binary | TargetKind::TestBinary => "python_binary",
            TargetKind::Test => "python_tests",
        }
    }
}

impl From<TargetType> for TargetKind {
    fn from(ty: TargetType) -> Self {
        match ty {
            TargetType::Library => TargetKind::Library,
            TargetType::Binary => TargetKind::Binary,
            TargetType::Test => TargetKind::Test,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetKind::Library => "library",
            TargetKind::Binary => "binary",
            TargetKind::Test => "test",
            TargetKind::TestBinary => "test_binary",
        };
        f.write_str(s)
    }
}

/// Value of an extra attribute on a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Str(String),
    List(Vec<String>),
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Str(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Str(s)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        AttributeValue::List(v)
    }
}

/// One synthesized build target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDeclaration {
    pub kind: TargetKind,

    /// Target name, unique within its BUILD file
    pub name: String,

    /// Source globs relative to the package root
    #[serde(default)]
    pub source_globs: Vec<String>,

    #[serde(default)]
    pub dependencies: BTreeSet<String>,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Kind-specific attributes (entry point, coverage, ...)
    #[serde(default)]
    pub extra_attributes: BTreeMap<String, AttributeValue>,
}

impl TargetDeclaration {
    /// Create a new declaration with the given kind and name.
    pub fn new(kind: TargetKind, name: impl Into<String>) -> Self {
        TargetDeclaration {
            kind,
            name: name.into(),
            source_globs: Vec::new(),
            dependencies: BTreeSet::new(),
            tags: BTreeSet::new(),
            extra_attributes: BTreeMap::new(),
        }
    }

    pub fn with_sources(mut self, globs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.source_globs = globs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.extra_attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.extra_attributes.get(key)
    }
}
