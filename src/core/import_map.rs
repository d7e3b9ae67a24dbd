//! Third-party import map.
//!
//! `import-map.json` translates an importable module name to the label of
//! the third-party target that provides it:
//!
//! ```json
//! { "requests": "//3rdparty/python:requests", "yaml": "//3rdparty/python:PyYAML" }
//! ```
//!
//! The map is authoritative. The requirements file is only used to check
//! that every mapped distribution is actually declared by the repository.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::util::diagnostic::{suggestions, Diagnostic};

static REQUIREMENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)").expect("valid regex"));

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("valid regex"));

/// Loaded import map plus the diagnostics produced while loading it.
#[derive(Debug, Clone, Default)]
pub struct ImportMapIndex {
    map: BTreeMap<String, String>,
    diagnostics: Vec<Diagnostic>,
}

impl ImportMapIndex {
    /// Load the import map and cross-check it against the requirements.
    ///
    /// Never fails: an absent or unreadable map yields an empty index and a
    /// warning, so every third-party import ends up unresolved.
    pub fn load(import_map_path: &Path, requirements_path: &Path) -> Self {
        let mut index = ImportMapIndex::default();

        match std::fs::read_to_string(import_map_path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&contents) {
                Ok(raw) => {
                    for (module, label) in raw {
                        match label {
                            serde_json::Value::String(label) => {
                                index.map.insert(module, label);
                            }
                            other => index.warn(
                                Diagnostic::warning(format!(
                                    "import map entry `{}` is not a string label",
                                    module
                                ))
                                .with_location(import_map_path)
                                .with_context(format!("found {}", other)),
                            ),
                        }
                    }
                }
                Err(e) => index.warn(
                    Diagnostic::warning("import map is not a JSON object of labels")
                        .with_location(import_map_path)
                        .with_context(e.to_string()),
                ),
            },
            Err(e) => index.warn(
                Diagnostic::warning("third-party import map could not be read")
                    .with_location(import_map_path)
                    .with_context(e.to_string())
                    .with_context("every third-party import will be reported as unresolved"),
            ),
        }

        if !index.map.is_empty() {
            match std::fs::read_to_string(requirements_path) {
                Ok(text) => index.cross_check(&parse_requirements(&text), requirements_path),
                Err(e) => index.warn(
                    Diagnostic::warning("requirements file could not be read; skipping cross-check")
                        .with_location(requirements_path)
                        .with_context(e.to_string()),
                ),
            }
        }

        tracing::debug!("loaded {} import map entries", index.map.len());
        index
    }

    /// Build an index from an in-memory map (no cross-check).
    #[cfg(test)]
    pub fn from_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        ImportMapIndex {
            map: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            diagnostics: Vec::new(),
        }
    }

    /// Resolve an imported module to a third-party label.
    ///
    /// Dotted names are tried longest prefix first, so a map entry for
    /// `google.protobuf` wins over one for `google`.
    pub fn resolve(&self, import_name: &str) -> Option<&str> {
        let mut candidate = import_name;
        loop {
            if let Some(label) = self.map.get(candidate) {
                return Some(label);
            }
            match candidate.rfind('.') {
                Some(pos) => candidate = &candidate[..pos],
                None => return None,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Warnings produced while loading.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    fn cross_check(&mut self, requirements: &BTreeSet<String>, requirements_path: &Path) {
        let missing: BTreeSet<String> = self
            .map
            .values()
            .map(|label| distribution_of(label))
            .filter(|dist| !requirements.contains(&normalize_distribution(dist)))
            .map(str::to_string)
            .collect();

        for dist in missing {
            self.warn(
                Diagnostic::warning(format!(
                    "distribution `{}` is mapped but not declared as a requirement",
                    dist
                ))
                .with_location(requirements_path)
                .with_suggestion(suggestions::MISSING_REQUIREMENT),
            );
        }
    }
}

/// The distribution named by a third-party label (`//3rdparty/python:requests` -> `requests`).
pub fn distribution_of(label: &str) -> &str {
    match label.rfind(':') {
        Some(pos) => &label[pos + 1..],
        None => label.rsplit('/').next().unwrap_or(label),
    }
}

/// Normalize a distribution name (lowercase, runs of `-_.` collapsed to `-`).
pub fn normalize_distribution(name: &str) -> String {
    SEPARATOR_RUN
        .replace_all(&name.to_ascii_lowercase(), "-")
        .into_owned()
}

/// Distribution names declared in a requirements file, normalized.
pub fn parse_requirements(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .filter(|line| !line.trim_start().starts_with('-'))
        .filter_map(|line| REQUIREMENT_NAME.captures(line))
        .map(|caps| normalize_distribution(&caps[1]))
        .collect()
}
