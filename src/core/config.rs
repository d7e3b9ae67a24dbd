//! `.pypants.cfg` configuration support.
//!
//! Configuration lives in two places:
//! - Repository root: `[project]` settings for the whole run, plus an optional
//!   `[package]` section holding defaults for every package.
//! - Package directory: a `[package]` section for that package only.
//!
//! The schema at the repository root is:
//!
//! ```toml
//! [project]
//! ignore_dirs = []
//! ignore_targets = []
//! python_package_name_prefix = ""
//! third_party_import_map_path = "3rdparty/python/import-map.json"
//! third_party_requirements_path = "3rdparty/python/requirements.txt"
//! top_dirs = ["."]
//! ```
//!
//! and in a package directory:
//!
//! ```toml
//! [package]
//! extra_dependencies = ["lib/python_core/src"]
//! extra_tags = ["my-tag"]
//! generate_build_file = true
//! generate_local_binary = false
//! generate_pytest_binary = false
//! include_test_coverage = true
//! type = "library"
//! ```
//!
//! Package values override the repository-wide `[package]` defaults field by
//! field; anything left unset falls back to the built-in defaults.
//!
//! A file that is not valid TOML is read as INI instead, so configs written
//! in the older style still load:
//!
//! ```ini
//! [package]
//! type = library
//! generate_pytest_binary = True
//! extra_tags = ["my-tag"]
//! ```
//!
//! INI values are plain strings and go through the same field conversions;
//! one pair of surrounding quotes is stripped.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};

use crate::core::errors::PypantsError;

/// File name of the configuration file, both at the root and per package.
pub const CONFIG_FILE_NAME: &str = ".pypants.cfg";

pub const DEFAULT_IMPORT_MAP_PATH: &str = "3rdparty/python/import-map.json";
pub const DEFAULT_REQUIREMENTS_PATH: &str = "3rdparty/python/requirements.txt";

const PROJECT_KEYS: &[&str] = &[
    "ignore_dirs",
    "ignore_targets",
    "python_package_name_prefix",
    "third_party_import_map_path",
    "third_party_requirements_path",
    "top_dirs",
];

const PACKAGE_KEYS: &[&str] = &[
    "extra_dependencies",
    "extra_tags",
    "generate_build_file",
    "generate_local_binary",
    "generate_pytest_binary",
    "include_test_coverage",
    "type",
];

/// Repository-wide settings from the `[project]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Never look for or process files in directories with these names
    pub ignore_dirs: BTreeSet<String>,

    /// Target or package names dropped from the synthesized output
    pub ignore_targets: BTreeSet<String>,

    /// Prefix for generated package names
    pub python_package_name_prefix: String,

    /// Import map location, relative to the repository root
    pub third_party_import_map_path: PathBuf,

    /// Requirements file location, relative to the repository root
    pub third_party_requirements_path: PathBuf,

    /// Top-level directories to search for Python packages
    pub top_dirs: Vec<String>,

    /// Repository-wide `[package]` defaults
    pub package_defaults: PackageConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            ignore_dirs: BTreeSet::new(),
            ignore_targets: BTreeSet::new(),
            python_package_name_prefix: String::new(),
            third_party_import_map_path: PathBuf::from(DEFAULT_IMPORT_MAP_PATH),
            third_party_requirements_path: PathBuf::from(DEFAULT_REQUIREMENTS_PATH),
            top_dirs: vec![".".to_string()],
            package_defaults: PackageConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Load the repository-level configuration.
    ///
    /// A missing file yields the defaults.
    pub fn load(repo_root: &Path) -> Result<Self, PypantsError> {
        let path = repo_root.join(CONFIG_FILE_NAME);
        let Some(table) = read_table(&path)? else {
            tracing::debug!("no {} at {}, using defaults", CONFIG_FILE_NAME, repo_root.display());
            return Ok(ProjectConfig::default());
        };

        let mut config = ProjectConfig::default();
        let project = Section::new(&table, "project", &path)?;
        project.warn_unknown(PROJECT_KEYS);

        if let Some(dirs) = project.list("ignore_dirs")? {
            config.ignore_dirs = dirs.into_iter().collect();
        }
        if let Some(targets) = project.list("ignore_targets")? {
            config.ignore_targets = targets.into_iter().collect();
        }
        if let Some(prefix) = project.string("python_package_name_prefix")? {
            config.python_package_name_prefix = prefix;
        }
        if let Some(p) = project.string("third_party_import_map_path")? {
            config.third_party_import_map_path = PathBuf::from(p);
        }
        if let Some(p) = project.string("third_party_requirements_path")? {
            config.third_party_requirements_path = PathBuf::from(p);
        }
        if let Some(dirs) = project.list("top_dirs")? {
            config.top_dirs = dirs;
        }

        config.package_defaults = PackageConfig::from_table(&table, &path)?;

        tracing::debug!("loaded project config from {}", path.display());
        Ok(config)
    }

    /// Label prefix under which third-party targets live (e.g. `//3rdparty/python`).
    pub fn third_party_label_prefix(&self) -> String {
        label_prefix_for(&self.third_party_import_map_path)
    }
}

/// Package-scoped settings from a `[package]` section. Every field is optional
/// so that layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageConfig {
    pub extra_dependencies: Option<BTreeSet<String>>,
    pub extra_tags: Option<BTreeSet<String>>,
    pub generate_build_file: Option<bool>,
    pub generate_local_binary: Option<bool>,
    pub generate_pytest_binary: Option<bool>,
    pub include_test_coverage: Option<bool>,
    pub package_type: Option<String>,
}

impl PackageConfig {
    /// Load the `[package]` section of a package directory's config file.
    ///
    /// A missing file yields an empty layer.
    pub fn load(package_dir: &Path) -> Result<Self, PypantsError> {
        let path = package_dir.join(CONFIG_FILE_NAME);
        match read_table(&path)? {
            Some(table) => Self::from_table(&table, &path),
            None => Ok(PackageConfig::default()),
        }
    }

    fn from_table(table: &toml::Table, path: &Path) -> Result<Self, PypantsError> {
        let section = Section::new(table, "package", path)?;
        section.warn_unknown(PACKAGE_KEYS);

        Ok(PackageConfig {
            extra_dependencies: section
                .list("extra_dependencies")?
                .map(|v| v.into_iter().collect()),
            extra_tags: section.list("extra_tags")?.map(|v| v.into_iter().collect()),
            generate_build_file: section.boolean("generate_build_file")?,
            generate_local_binary: section.boolean("generate_local_binary")?,
            generate_pytest_binary: section.boolean("generate_pytest_binary")?,
            include_test_coverage: section.boolean("include_test_coverage")?,
            package_type: section.string("type")?.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Merge another layer into this one (other takes precedence).
    pub fn merge(&mut self, other: PackageConfig) {
        if other.extra_dependencies.is_some() {
            self.extra_dependencies = other.extra_dependencies;
        }
        if other.extra_tags.is_some() {
            self.extra_tags = other.extra_tags;
        }
        if other.generate_build_file.is_some() {
            self.generate_build_file = other.generate_build_file;
        }
        if other.generate_local_binary.is_some() {
            self.generate_local_binary = other.generate_local_binary;
        }
        if other.generate_pytest_binary.is_some() {
            self.generate_pytest_binary = other.generate_pytest_binary;
        }
        if other.include_test_coverage.is_some() {
            self.include_test_coverage = other.include_test_coverage;
        }
        if other.package_type.is_some() {
            self.package_type = other.package_type;
        }
    }
}

/// Fully merged settings for one package.
///
/// Built once per package directory and passed by reference into every
/// resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub ignore_dirs: BTreeSet<String>,
    pub ignore_targets: BTreeSet<String>,
    pub package_name_prefix: String,
    pub third_party_import_map_path: PathBuf,
    pub third_party_requirements_path: PathBuf,
    pub top_dirs: Vec<String>,
    pub extra_dependencies: BTreeSet<String>,
    pub extra_tags: BTreeSet<String>,
    pub generate_build_file: bool,
    pub generate_local_binary: bool,
    pub generate_pytest_binary: bool,
    pub include_test_coverage: bool,
    /// Explicit package type; `None` means infer it
    pub package_type: Option<String>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        EffectiveConfig::merge(&ProjectConfig::default(), &PackageConfig::default())
    }
}

impl EffectiveConfig {
    /// Combine project settings, repository-wide package defaults, and one
    /// package's own layer.
    pub fn merge(project: &ProjectConfig, package: &PackageConfig) -> Self {
        let mut layer = project.package_defaults.clone();
        layer.merge(package.clone());

        EffectiveConfig {
            ignore_dirs: project.ignore_dirs.clone(),
            ignore_targets: project.ignore_targets.clone(),
            package_name_prefix: project.python_package_name_prefix.clone(),
            third_party_import_map_path: project.third_party_import_map_path.clone(),
            third_party_requirements_path: project.third_party_requirements_path.clone(),
            top_dirs: project.top_dirs.clone(),
            extra_dependencies: layer.extra_dependencies.unwrap_or_default(),
            extra_tags: layer.extra_tags.unwrap_or_default(),
            generate_build_file: layer.generate_build_file.unwrap_or(true),
            generate_local_binary: layer.generate_local_binary.unwrap_or(false),
            generate_pytest_binary: layer.generate_pytest_binary.unwrap_or(false),
            include_test_coverage: layer.include_test_coverage.unwrap_or(true),
            package_type: layer.package_type,
        }
    }

    /// Label prefix under which third-party targets live.
    pub fn third_party_label_prefix(&self) -> String {
        label_prefix_for(&self.third_party_import_map_path)
    }

    /// Set a single field from its config-file spelling.
    ///
    /// Only for tests and bootstrapping; never called while resolving.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), PypantsError> {
        let origin = Path::new("<override>");
        let raw = toml::Value::String(value.to_string());
        let field = |message: String| PypantsError::config_parse(key, origin, message);

        match key {
            "ignore_dirs" => self.ignore_dirs = to_list(&raw).map_err(field)?.into_iter().collect(),
            "ignore_targets" => {
                self.ignore_targets = to_list(&raw).map_err(field)?.into_iter().collect()
            }
            "python_package_name_prefix" => self.package_name_prefix = value.to_string(),
            "third_party_import_map_path" => {
                self.third_party_import_map_path = PathBuf::from(value)
            }
            "third_party_requirements_path" => {
                self.third_party_requirements_path = PathBuf::from(value)
            }
            "top_dirs" => self.top_dirs = to_list(&raw).map_err(field)?,
            "extra_dependencies" => {
                self.extra_dependencies = to_list(&raw).map_err(field)?.into_iter().collect()
            }
            "extra_tags" => self.extra_tags = to_list(&raw).map_err(field)?.into_iter().collect(),
            "generate_build_file" => self.generate_build_file = to_bool(&raw).map_err(field)?,
            "generate_local_binary" => self.generate_local_binary = to_bool(&raw).map_err(field)?,
            "generate_pytest_binary" => {
                self.generate_pytest_binary = to_bool(&raw).map_err(field)?
            }
            "include_test_coverage" => self.include_test_coverage = to_bool(&raw).map_err(field)?,
            "type" => {
                self.package_type = Some(value.trim().to_string()).filter(|t| !t.is_empty())
            }
            _ => return Err(field("unknown configuration key".to_string())),
        }
        Ok(())
    }
}

/// Resolve the effective configuration of the package rooted at `package_dir`.
pub fn resolve(project: &ProjectConfig, package_dir: &Path) -> Result<EffectiveConfig, PypantsError> {
    let package = PackageConfig::load(package_dir)?;
    Ok(EffectiveConfig::merge(project, &package))
}

/// Third-party targets live next to the import map.
fn label_prefix_for(import_map_path: &Path) -> String {
    let dir = import_map_path
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    format!("//{}", dir.trim_matches('/'))
}

/// Read a config file into a table; `Ok(None)` when the file does not exist.
fn read_table(path: &Path) -> Result<Option<toml::Table>, PypantsError> {
    if !path.is_file() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| PypantsError::config_parse("(file)", path, format!("failed to read: {}", e)))?;

    match contents.parse::<toml::Table>() {
        Ok(table) => Ok(Some(table)),
        Err(toml_err) => {
            let table = ini_table(&contents).map_err(|ini_err| {
                PypantsError::config_parse(
                    "(file)",
                    path,
                    format!("{} (also not valid INI: {})", toml_err.message().trim_end(), ini_err),
                )
            })?;
            tracing::debug!("read {} as INI", path.display());
            Ok(Some(table))
        }
    }
}

/// Parse INI text into the same shape as a TOML file: one table per
/// section, every value a string. Keys outside any section are dropped.
fn ini_table(contents: &str) -> Result<toml::Table, ini::ParseError> {
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(contents, options)?;

    let mut table = toml::Table::new();
    for (section, properties) in ini.iter() {
        let Some(section) = section else {
            continue;
        };
        let entry = table
            .entry(section.trim().to_string())
            .or_insert(toml::Value::Table(toml::Table::new()));
        if let toml::Value::Table(fields) = entry {
            for (key, value) in properties.iter() {
                fields.insert(
                    key.trim().to_ascii_lowercase(),
                    toml::Value::String(unquote(value.trim()).to_string()),
                );
            }
        }
    }
    Ok(table)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// One section of a config file, with per-field conversion errors.
struct Section<'a> {
    table: Option<&'a toml::Table>,
    name: &'static str,
    path: &'a Path,
}

impl<'a> Section<'a> {
    fn new(file: &'a toml::Table, name: &'static str, path: &'a Path) -> Result<Self, PypantsError> {
        let table = match file.get(name) {
            None => None,
            Some(toml::Value::Table(t)) => Some(t),
            Some(other) => {
                return Err(PypantsError::config_parse(
                    name,
                    path,
                    format!("expected a section, found {}", other.type_str()),
                ))
            }
        };
        Ok(Section { table, name, path })
    }

    fn warn_unknown(&self, known: &[&str]) {
        for key in self.table.into_iter().flat_map(|t| t.keys()) {
            if !known.contains(&key.as_str()) {
                tracing::warn!(
                    "unknown key `{}.{}` in {}",
                    self.name,
                    key,
                    self.path.display()
                );
            }
        }
    }

    fn get<T>(
        &self,
        key: &str,
        convert: impl Fn(&toml::Value) -> Result<T, String>,
    ) -> Result<Option<T>, PypantsError> {
        let Some(value) = self.table.and_then(|t| t.get(key)) else {
            return Ok(None);
        };
        convert(value).map(Some).map_err(|message| {
            PypantsError::config_parse(format!("{}.{}", self.name, key), self.path, message)
        })
    }

    fn string(&self, key: &str) -> Result<Option<String>, PypantsError> {
        self.get(key, to_string)
    }

    fn list(&self, key: &str) -> Result<Option<Vec<String>>, PypantsError> {
        self.get(key, to_list)
    }

    fn boolean(&self, key: &str) -> Result<Option<bool>, PypantsError> {
        self.get(key, to_bool)
    }
}

fn to_string(value: &toml::Value) -> Result<String, String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        other => Err(format!("expected a string, found {}", other.type_str())),
    }
}

/// Lists are native arrays or JSON-encoded strings.
fn to_list(value: &toml::Value) -> Result<Vec<String>, String> {
    match value {
        toml::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                toml::Value::String(s) => Ok(s.clone()),
                other => Err(format!("expected a list of strings, found {} item", other.type_str())),
            })
            .collect(),
        toml::Value::String(s) => serde_json::from_str::<Vec<String>>(s)
            .map_err(|e| format!("invalid JSON list {:?}: {}", s, e)),
        other => Err(format!("expected a list of strings, found {}", other.type_str())),
    }
}

fn to_bool(value: &toml::Value) -> Result<bool, String> {
    match value {
        toml::Value::Boolean(b) => Ok(*b),
        toml::Value::Integer(0) => Ok(false),
        toml::Value::Integer(1) => Ok(true),
        toml::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(format!("expected a boolean, found {:?}", s)),
        },
        other => Err(format!("expected a boolean, found {}", other.type_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE_NAME), contents).unwrap();
    }

    #[test]
    fn test_defaults_without_config_files() {
        let tmp = TempDir::new().unwrap();
        let project = ProjectConfig::load(tmp.path()).unwrap();
        assert_eq!(project, ProjectConfig::default());

        let config = resolve(&project, &tmp.path().join("pkg")).unwrap();
        assert!(config.ignore_dirs.is_empty());
        assert!(config.ignore_targets.is_empty());
        assert!(config.extra_tags.is_empty());
        assert!(config.extra_dependencies.is_empty());
        assert_eq!(config.package_name_prefix, "");
        assert_eq!(config.top_dirs, vec!["."]);
        assert!(config.generate_build_file);
        assert!(!config.generate_local_binary);
        assert!(!config.generate_pytest_binary);
        assert!(config.include_test_coverage);
        assert_eq!(config.package_type, None);
        assert_eq!(
            config.third_party_import_map_path,
            PathBuf::from(DEFAULT_IMPORT_MAP_PATH)
        );
    }

    #[test]
    fn test_project_config_load() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
[project]
ignore_dirs = ["build", "node_modules"]
ignore_targets = ["legacy"]
python_package_name_prefix = "acme-"
third_party_import_map_path = "deps/python/import-map.json"
top_dirs = ["lib", "apps"]
"#,
        );

        let project = ProjectConfig::load(tmp.path()).unwrap();
        assert!(project.ignore_dirs.contains("node_modules"));
        assert!(project.ignore_targets.contains("legacy"));
        assert_eq!(project.python_package_name_prefix, "acme-");
        assert_eq!(project.top_dirs, vec!["lib", "apps"]);
        assert_eq!(project.third_party_label_prefix(), "//deps/python");
        assert_eq!(
            project.third_party_requirements_path,
            PathBuf::from(DEFAULT_REQUIREMENTS_PATH)
        );
    }

    #[test]
    fn test_package_overrides_repo_defaults_per_field() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
[package]
extra_tags = ["repo-tag"]
generate_pytest_binary = true
include_test_coverage = false
"#,
        );
        let pkg = tmp.path().join("lib/foo");
        write_config(
            &pkg,
            r#"
[package]
extra_tags = ["pkg-tag"]
type = "binary"
"#,
        );

        let project = ProjectConfig::load(tmp.path()).unwrap();
        let config = resolve(&project, &pkg).unwrap();

        // Overridden
        assert_eq!(config.extra_tags, BTreeSet::from(["pkg-tag".to_string()]));
        assert_eq!(config.package_type.as_deref(), Some("binary"));
        // Inherited from the repository defaults
        assert!(config.generate_pytest_binary);
        assert!(!config.include_test_coverage);
        // Built-in default
        assert!(config.generate_build_file);
    }

    #[test]
    fn test_json_string_lists_and_string_booleans() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            r#"
[package]
extra_dependencies = '["lib/python_core/src", "//3rdparty/python:six"]'
generate_build_file = "no"
generate_local_binary = "On"
"#,
        );

        let config = resolve(&ProjectConfig::default(), tmp.path()).unwrap();
        assert_eq!(config.extra_dependencies.len(), 2);
        assert!(config.extra_dependencies.contains("lib/python_core/src"));
        assert!(!config.generate_build_file);
        assert!(config.generate_local_binary);
    }

    #[test]
    fn test_invalid_json_list_names_field_and_file() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[package]\nextra_tags = '[\"a\", '\n");

        let err = resolve(&ProjectConfig::default(), tmp.path()).unwrap_err();
        match err {
            PypantsError::ConfigParse { field, path, .. } => {
                assert_eq!(field, "package.extra_tags");
                assert_eq!(path, tmp.path().join(CONFIG_FILE_NAME));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_boolean_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[package]\ngenerate_build_file = \"maybe\"\n");

        let err = PackageConfig::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("package.generate_build_file"));
    }

    #[test]
    fn test_syntax_error_is_reported_against_file() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[project\nignore_dirs = [");

        let err = ProjectConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(err, PypantsError::ConfigParse { ref field, .. } if field == "(file)"));
    }

    #[test]
    fn test_ini_style_config_loads() {
        let tmp = TempDir::new().unwrap();
        write_config(
            tmp.path(),
            "[project]\n\
             python_package_name_prefix =\n\
             top_dirs = [\"lib\", \"apps\"]\n\
             third_party_import_map_path = \"deps/import-map.json\"\n\
             \n\
             [package]\n\
             type = library\n\
             generate_pytest_binary = True\n\
             include_test_coverage = False\n\
             extra_tags = [\"my-tag\"]\n",
        );

        let project = ProjectConfig::load(tmp.path()).unwrap();
        assert_eq!(project.python_package_name_prefix, "");
        assert_eq!(project.top_dirs, vec!["lib".to_string(), "apps".to_string()]);
        assert_eq!(project.third_party_import_map_path, PathBuf::from("deps/import-map.json"));

        let config = resolve(&project, tmp.path()).unwrap();
        assert_eq!(config.package_type.as_deref(), Some("library"));
        assert!(config.generate_pytest_binary);
        assert!(!config.include_test_coverage);
        assert!(config.extra_tags.contains("my-tag"));
    }

    #[test]
    fn test_ini_style_field_errors_name_the_field() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "[package]\ntype = library\ngenerate_build_file = maybe\n");

        let err = PackageConfig::load(tmp.path()).unwrap_err();
        assert!(
            matches!(err, PypantsError::ConfigParse { ref field, .. } if field == "package.generate_build_file")
        );
    }

    #[test]
    fn test_set_overrides_single_field() {
        let mut config = EffectiveConfig::default();
        config.set("extra_tags", r#"["a", "b"]"#).unwrap();
        config.set("generate_build_file", "false").unwrap();
        config.set("type", "test").unwrap();

        assert_eq!(config.extra_tags.len(), 2);
        assert!(!config.generate_build_file);
        assert_eq!(config.package_type.as_deref(), Some("test"));
        assert!(config.set("no_such_key", "1").is_err());
        assert!(config.set("include_test_coverage", "sometimes").is_err());
    }
}
