//! `pypants resolve` command
//!
//! Prints what one package's imports resolve to, as JSON on stdout.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::cli::{GlobalArgs, ResolveArgs};
use crate::commands::{load_workspace, shell};
use pypants::ops::classify;
use pypants::resolver::{resolve_imports, ResolvedDependencies};
use pypants::util::diagnostic::emit;

#[derive(Serialize)]
struct ResolveOutput<'a> {
    package: &'a str,
    root: &'a str,
    #[serde(rename = "type")]
    target_type: Option<String>,
    #[serde(flatten)]
    dependencies: ResolvedDependencies,
}

pub fn execute(global: &GlobalArgs, args: ResolveArgs) -> Result<()> {
    let shell = shell(global);
    let ws = load_workspace(global, &shell)?;

    let package = ws.package(&args.package).ok_or_else(|| {
        let names: Vec<&str> = ws.index().iter().map(|p| p.name()).collect();
        anyhow!(
            "package `{}` not found\n\
             available packages: {}",
            args.package,
            if names.is_empty() {
                "(none)".to_string()
            } else {
                names.join(", ")
            }
        )
    })?;

    let config = ws
        .effective_config(package)
        .with_context(|| format!("failed to load configuration of `{}`", package.name()))?;

    let target_type = match classify(package, &config) {
        Ok(ty) => Some(ty.to_string()),
        Err(err) => {
            emit(&err.to_diagnostic(), shell.use_color());
            None
        }
    };

    let report = resolve_imports(package, ws.index(), ws.import_map(), &config);
    if !shell.is_quiet() {
        for err in &report.source_errors {
            emit(&err.to_diagnostic(), shell.use_color());
        }
    }

    let output = ResolveOutput {
        package: package.name(),
        root: package.rel_root(),
        target_type,
        dependencies: report.dependencies,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
