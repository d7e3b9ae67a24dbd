//! BUILD file rendering.
//!
//! Turns declarations into Pants target calls:
//!
//! ```text
//! python_library(
//!     name="lib",
//!     sources=["**/*"],
//!     dependencies=[
//!         "//3rdparty/python:requests",
//!         "//foo/bar:lib",
//!     ],
//!     package_name="foo",
//! )
//! ```
//!
//! Output is byte-stable: every list is sorted (except sources, which keep
//! declaration order) and attributes come out in a fixed order.

use crate::core::target::{AttributeValue, TargetDeclaration};

/// First line of every generated BUILD file.
pub const GENERATED_HEADER: &str = "# Generated by pypants. Do not edit by hand.";

const INDENT: &str = "    ";

/// Render a whole BUILD file.
pub fn render_build_file(declarations: &[TargetDeclaration]) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push('\n');
    for decl in declarations {
        out.push('\n');
        out.push_str(&render_declaration(decl));
    }
    out
}

/// Whether `contents` was written by [`render_build_file`].
pub fn is_generated(contents: &str) -> bool {
    contents.lines().next() == Some(GENERATED_HEADER)
}

/// Render one target call.
pub fn render_declaration(decl: &TargetDeclaration) -> String {
    let mut out = format!("{}(\n", decl.kind.pants_function());
    attribute(&mut out, "name", &quote(&decl.name));

    if !decl.source_globs.is_empty() {
        write_list(&mut out, "sources", decl.source_globs.iter());
    }
    if !decl.dependencies.is_empty() {
        write_list(&mut out, "dependencies", decl.dependencies.iter());
    }
    if !decl.tags.is_empty() {
        write_list(&mut out, "tags", decl.tags.iter());
    }

    for (key, value) in &decl.extra_attributes {
        match value {
            AttributeValue::Bool(b) => attribute(&mut out, key, if *b { "True" } else { "False" }),
            AttributeValue::Str(s) => attribute(&mut out, key, &quote(s)),
            AttributeValue::List(items) => {
                let mut sorted: Vec<&String> = items.iter().collect();
                sorted.sort();
                sorted.dedup();
                write_list(&mut out, key, sorted.into_iter());
            }
        }
    }

    out.push_str(")\n");
    out
}

/// `    key=value,`
fn attribute(out: &mut String, key: &str, value: &str) {
    out.push_str(&format!("{}{}={},\n", INDENT, key, value));
}

/// Single-element lists stay on one line; longer ones get one item per line.
fn write_list<'a>(out: &mut String, key: &str, items: impl ExactSizeIterator<Item = &'a String>) {
    if items.len() <= 1 {
        let items: Vec<String> = items.map(|i| quote(i)).collect();
        attribute(out, key, &format!("[{}]", items.join(", ")));
        return;
    }

    out.push_str(&format!("{}{}=[\n", INDENT, key));
    for item in items {
        out.push_str(&format!("{}{}{},\n", INDENT, INDENT, quote(item)));
    }
    out.push_str(&format!("{}],\n", INDENT));
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
