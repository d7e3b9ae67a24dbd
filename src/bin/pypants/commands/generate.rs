//! `pypants generate` command

use anyhow::{bail, Result};

use crate::cli::{GenerateArgs, GlobalArgs};
use crate::commands::{load_workspace, shell};
use pypants::ops::{generate, GenerateOptions};
use pypants::util::diagnostic::emit;
use pypants::util::fs::relative_path;
use pypants::util::shell::Status;

pub fn execute(global: &GlobalArgs, args: GenerateArgs) -> Result<()> {
    let shell = shell(global);
    let ws = load_workspace(global, &shell)?;

    let opts = GenerateOptions {
        dry_run: args.dry_run,
        check: args.check,
        jobs: args.jobs,
    };

    let progress = shell.progress(ws.index().len() as u64, "Scanning");
    let report = generate(&ws, &opts, |package| progress.inc(package.name()))?;
    progress.finish();

    for (path, contents) in &report.rendered {
        println!("# {}", relative_path(ws.root(), path).display());
        print!("{}", contents);
        println!();
    }

    for diag in report.diagnostics() {
        if diag.is_error() || !shell.is_quiet() {
            emit(&diag, shell.use_color());
        }
    }

    if !opts.dry_run {
        for path in &report.written {
            shell.status(Status::Generated, relative_path(ws.root(), path).display());
        }
    }
    for path in &report.stale {
        shell.status(Status::Stale, relative_path(ws.root(), path).display());
    }
    for name in &report.skipped {
        if shell.is_verbose() {
            shell.status(Status::Skipped, name);
        }
    }

    shell.status(Status::Finished, report.summary());

    if report.has_failures() {
        bail!("{} package(s) failed", report.failures.len());
    }
    if opts.check && !report.stale.is_empty() {
        bail!(
            "{} BUILD file(s) out of date; run `pypants generate`",
            report.stale.len()
        );
    }

    Ok(())
}
