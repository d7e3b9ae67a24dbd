//! `pypants list` command

use anyhow::Result;

use crate::cli::{GlobalArgs, ListArgs};
use crate::commands::{load_workspace, shell};
use pypants::ops::classify;

pub fn execute(global: &GlobalArgs, args: ListArgs) -> Result<()> {
    let shell = shell(global);
    let ws = load_workspace(global, &shell)?;

    for package in ws.index().iter() {
        if !args.types {
            println!("{} {}", package.name(), package.rel_root());
            continue;
        }

        let ty = ws
            .effective_config(package)
            .and_then(|config| classify(package, &config))
            .map(|ty| ty.to_string())
            .unwrap_or_else(|err| {
                shell.warn(&err);
                "?".to_string()
            });
        println!("{} {} {}", package.name(), package.rel_root(), ty);
    }

    Ok(())
}
