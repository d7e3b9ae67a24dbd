//! `pypants graph` command

use anyhow::{bail, Result};

use crate::cli::{GlobalArgs, GraphArgs};
use crate::commands::{load_workspace, shell};
use pypants::ops::PackageGraph;
use pypants::util::diagnostic::emit;

pub fn execute(global: &GlobalArgs, args: GraphArgs) -> Result<()> {
    let shell = shell(global);
    let ws = load_workspace(global, &shell)?;
    let graph = PackageGraph::build(&ws);

    if let Some(name) = &args.package {
        if ws.package(name).is_none() {
            bail!("package `{}` not found", name);
        }
        for dep in graph.dependencies(name) {
            println!("{}", dep);
        }
        return Ok(());
    }

    for diag in graph.cycle_diagnostics() {
        emit(&diag, shell.use_color());
    }

    // Dependencies first; with a cycle, fall back to name order
    let order: Vec<&str> = match graph.dependency_order() {
        Some(order) => order,
        None => ws.index().iter().map(|p| p.name()).collect(),
    };
    for name in order {
        let deps = graph.dependencies(name);
        if deps.is_empty() {
            println!("{}", name);
        } else {
            println!("{} -> {}", name, deps.join(", "));
        }
    }

    Ok(())
}
