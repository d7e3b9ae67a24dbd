//! Import extraction from Python sources.
//!
//! Sources are parsed into a syntax tree with tree-sitter. Every `import`
//! and `from ... import` statement in the tree is collected, including ones
//! nested in functions, conditionals and `try` blocks: a dependency that is
//! only imported lazily is still a runtime dependency.

use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::core::errors::PypantsError;

/// One imported module reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImportRef {
    /// Absolute import of a dotted module path (`os.path`, `requests`)
    Absolute(String),

    /// Relative import (`from . import x`, `from ..pkg import y`)
    Relative { level: usize, module: Option<String> },
}

impl ImportRef {
    /// First segment of an absolute import.
    pub fn top_level(&self) -> Option<&str> {
        match self {
            ImportRef::Absolute(module) => module.split('.').next(),
            ImportRef::Relative { .. } => None,
        }
    }
}

/// Read and scan one file.
pub fn scan_file(path: &Path) -> Result<Vec<ImportRef>, PypantsError> {
    let source = std::fs::read_to_string(path).map_err(|e| PypantsError::SourceParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    scan_source(&source).map_err(|message| PypantsError::SourceParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Extract every import from Python source text.
///
/// Fails when the source does not parse.
pub fn scan_source(source: &str) -> Result<Vec<ImportRef>, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| format!("failed to load the Python grammar: {}", e))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| "parser produced no syntax tree".to_string())?;
    let root = tree.root_node();

    if root.has_error() {
        let line = first_error(root).map(|n| n.start_position().row + 1).unwrap_or(1);
        return Err(format!("syntax error at line {}", line));
    }

    let bytes = source.as_bytes();
    let mut imports = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => collect_import(node, bytes, &mut imports),
            "import_from_statement" => collect_import_from(node, bytes, &mut imports),
            // `from __future__ import ...` is a compiler directive
            "future_import_statement" => {}
            _ => {
                let mut cursor = node.walk();
                let children: Vec<_> = node.children(&mut cursor).collect();
                stack.extend(children.into_iter().rev());
            }
        }
    }

    Ok(imports)
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

fn text(node: Node<'_>, source: &[u8]) -> String {
    node.utf8_text(source)
        .map(|t| t.split_whitespace().collect())
        .unwrap_or_default()
}

/// The dotted module named by an `import` clause, ignoring any alias.
fn imported_module(node: Node<'_>, source: &[u8]) -> Option<String> {
    match node.kind() {
        "dotted_name" => Some(text(node, source)),
        "aliased_import" => node
            .child_by_field_name("name")
            .map(|name| text(name, source)),
        _ => None,
    }
}

/// `import a.b, c as d`
fn collect_import(node: Node<'_>, source: &[u8], imports: &mut Vec<ImportRef>) {
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        if let Some(module) = imported_module(name, source).filter(|m| !m.is_empty()) {
            imports.push(ImportRef::Absolute(module));
        }
    }
}

/// `from a.b import c, d` and `from ..x import y`
fn collect_import_from(node: Node<'_>, source: &[u8], imports: &mut Vec<ImportRef>) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };

    if module_node.kind() == "relative_import" {
        let raw = text(module_node, source);
        let level = raw.chars().take_while(|c| *c == '.').count();
        let module = Some(raw[level..].to_string()).filter(|m| !m.is_empty());
        imports.push(ImportRef::Relative { level, module });
        return;
    }

    let module = text(module_node, source);
    if module.is_empty() {
        return;
    }

    // `from pkg import sub` may name a submodule, so record `pkg.sub`; the
    // longest-prefix lookup falls back to `pkg` when `sub` is an attribute.
    let mut cursor = node.walk();
    let names: Vec<String> = node
        .children_by_field_name("name", &mut cursor)
        .filter_map(|name| imported_module(name, source))
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        imports.push(ImportRef::Absolute(module));
    } else {
        for name in names {
            imports.push(ImportRef::Absolute(format!("{}.{}", module, name)));
        }
    }
}
