//! Implementation of `pypants generate`.
//!
//! Every package goes through the same pipeline:
//! effective config, classify, resolve imports, synthesize, render.
//!
//! The pipeline only reads the shared [`Workspace`], so packages are
//! processed in parallel on the rayon pool. Writing BUILD files happens
//! afterwards on the calling thread, in package-name order.

use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;

use crate::core::errors::{PypantsError, UnresolvedImport};
use crate::core::package::{PackageRecord, TargetType};
use crate::core::target::TargetDeclaration;
use crate::core::workspace::Workspace;
use crate::ops::classify::classify;
use crate::ops::render::{is_generated, render_build_file};
use crate::ops::synthesize::synthesize;
use crate::resolver::{resolve_imports, ResolvedDependencies};
use crate::util::diagnostic::Diagnostic;
use crate::util::fs;

/// Options for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Render but do not write anything
    pub dry_run: bool,

    /// Compare rendered output with the BUILD files on disk instead of writing
    pub check: bool,

    /// Number of parallel jobs
    pub jobs: Option<usize>,
}

/// Everything learned about one package, before anything is written.
#[derive(Debug, Clone)]
pub struct PackagePlan {
    pub package: PackageRecord,
    pub target_type: TargetType,
    pub dependencies: ResolvedDependencies,
    pub declarations: Vec<TargetDeclaration>,
    pub source_errors: Vec<PypantsError>,
}

impl PackagePlan {
    /// Rendered BUILD text, or `None` when the package gets no BUILD file.
    pub fn render(&self) -> Option<String> {
        if self.declarations.is_empty() {
            None
        } else {
            Some(render_build_file(&self.declarations))
        }
    }
}

/// Outcome of the per-package pipeline.
#[derive(Debug, Clone)]
pub enum PackageOutcome {
    /// Declarations synthesized (possibly none, if all were ignored)
    Planned(Box<PackagePlan>),

    /// `generate_build_file` is off for this package
    Excluded(PackageRecord),

    /// Config or classification error for this package
    Failed(PackageRecord, PypantsError),
}

/// Run the pipeline for a single package.
///
/// Never writes to disk.
pub fn process_package(ws: &Workspace, package: &PackageRecord) -> PackageOutcome {
    let config = match ws.effective_config(package) {
        Ok(config) => config,
        Err(err) => return PackageOutcome::Failed(package.clone(), err),
    };

    if !config.generate_build_file {
        tracing::debug!("{}: generate_build_file is off, skipping", package.name());
        return PackageOutcome::Excluded(package.clone());
    }

    let target_type = match classify(package, &config) {
        Ok(ty) => ty,
        Err(err) => return PackageOutcome::Failed(package.clone(), err),
    };

    let report = resolve_imports(package, ws.index(), ws.import_map(), &config);
    let declarations = synthesize(package, target_type, &report.dependencies, &config);

    PackageOutcome::Planned(Box::new(PackagePlan {
        package: package.clone(),
        target_type,
        dependencies: report.dependencies,
        declarations,
        source_errors: report.source_errors,
    }))
}

/// Run the pipeline for every package of the workspace.
///
/// `on_done` is called once per package, from whichever worker finished it.
pub fn plan_all<F>(ws: &Workspace, jobs: Option<usize>, on_done: F) -> Vec<PackageOutcome>
where
    F: Fn(&PackageRecord) + Sync,
{
    if let Some(j) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(j)
            .build_global()
            .ok(); // Ignore if already set
    }

    let packages: Vec<&PackageRecord> = ws.index().iter().collect();
    packages
        .par_iter()
        .map(|package| {
            let outcome = process_package(ws, package);
            on_done(package);
            outcome
        })
        .collect()
}

/// Result of a generate run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// BUILD files written (or that would be written in dry-run mode)
    pub written: Vec<PathBuf>,

    /// BUILD files already up to date
    pub unchanged: Vec<PathBuf>,

    /// BUILD files whose contents differ from the rendered output (check mode)
    pub stale: Vec<PathBuf>,

    /// Rendered output, kept in dry-run mode only
    pub rendered: Vec<(PathBuf, String)>,

    /// Packages that get no BUILD file
    pub skipped: Vec<String>,

    /// Per-package errors
    pub failures: Vec<PypantsError>,

    /// Per-file parse errors
    pub source_errors: Vec<PypantsError>,

    pub unresolved: Vec<UnresolvedImport>,

    /// Warnings about the import map and requirements
    pub import_map_warnings: Vec<Diagnostic>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Every diagnostic of the run: errors first, then warnings.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diags: Vec<Diagnostic> = self.failures.iter().map(|e| e.to_diagnostic()).collect();
        diags.extend(self.import_map_warnings.iter().cloned());
        diags.extend(self.source_errors.iter().map(|e| e.to_diagnostic()));
        diags.extend(self.unresolved.iter().map(|u| u.to_diagnostic()));
        diags
    }

    /// One-line summary for the end of the run.
    pub fn summary(&self) -> String {
        format!(
            "{} generated, {} unchanged, {} skipped, {} failed, {} warnings",
            self.written.len(),
            self.unchanged.len(),
            self.skipped.len(),
            self.failures.len(),
            self.import_map_warnings.len() + self.source_errors.len() + self.unresolved.len()
        )
    }
}

/// Generate BUILD files for the whole workspace.
///
/// Per-package failures are collected into the report; only I/O errors
/// while writing abort the run.
pub fn generate<F>(ws: &Workspace, opts: &GenerateOptions, on_done: F) -> Result<RunReport>
where
    F: Fn(&PackageRecord) + Sync,
{
    let mut outcomes = plan_all(ws, opts.jobs, on_done);
    outcomes.sort_by(|a, b| outcome_name(a).cmp(outcome_name(b)));

    let mut report = RunReport {
        import_map_warnings: ws.import_map().diagnostics().to_vec(),
        ..RunReport::default()
    };

    for outcome in outcomes {
        let plan = match outcome {
            PackageOutcome::Planned(plan) => plan,
            PackageOutcome::Excluded(package) => {
                report.skipped.push(package.name().to_string());
                continue;
            }
            PackageOutcome::Failed(package, err) => {
                tracing::warn!("{}: {}", package.name(), err);
                report.failures.push(err);
                continue;
            }
        };

        report.source_errors.extend(plan.source_errors.iter().cloned());
        report.unresolved.extend(plan.dependencies.unresolved.iter().map(|import| {
            UnresolvedImport {
                package: plan.package.name().to_string(),
                import: import.clone(),
            }
        }));

        let Some(contents) = plan.render() else {
            report.skipped.push(plan.package.name().to_string());
            continue;
        };
        let path = plan.package.build_file_path();
        let current = std::fs::read_to_string(&path).ok();

        if current.as_deref() == Some(contents.as_str()) {
            report.unchanged.push(path);
            continue;
        }

        if opts.check {
            tracing::info!("{} is out of date", path.display());
            report.stale.push(path);
        } else if opts.dry_run {
            report.written.push(path.clone());
            report.rendered.push((path, contents));
        } else {
            if current.as_deref().is_some_and(|text| !is_generated(text)) {
                tracing::warn!("replacing hand-written {}", path.display());
            }
            fs::write_string(&path, &contents)?;
            tracing::debug!("wrote {}", path.display());
            report.written.push(path);
        }
    }

    for unresolved in &report.unresolved {
        tracing::warn!(
            "unresolved import `{}` in package `{}`",
            unresolved.import,
            unresolved.package
        );
    }

    Ok(report)
}

fn outcome_name(outcome: &PackageOutcome) -> &str {
    match outcome {
        PackageOutcome::Planned(plan) => plan.package.name(),
        PackageOutcome::Excluded(package) | PackageOutcome::Failed(package, _) => package.name(),
    }
}
