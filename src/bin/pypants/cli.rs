//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// pypants - generate Pants BUILD files for the Python packages of a monorepo
#[derive(Parser)]
#[command(name = "pypants")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Repository root (defaults to the enclosing git checkout)
    #[arg(long, global = true, env = "PYPANTS_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Flags shared by every command.
    pub fn global(&self) -> GlobalArgs {
        GlobalArgs {
            verbose: self.verbose,
            quiet: self.quiet,
            no_color: self.no_color,
            root: self.root.clone(),
        }
    }
}

/// Global flags, detached from the parsed command.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub verbose: bool,
    pub quiet: bool,
    pub no_color: bool,
    pub root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate BUILD files for every package
    Generate(GenerateArgs),

    /// Print the resolved dependencies of one package as JSON
    Resolve(ResolveArgs),

    /// List discovered packages
    List(ListArgs),

    /// Show the internal package dependency graph
    Graph(GraphArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Print BUILD files instead of writing them
    #[arg(long, conflicts_with = "check")]
    pub dry_run: bool,

    /// Fail if any BUILD file is out of date
    #[arg(long)]
    pub check: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Package name
    pub package: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Show each package's classified type
    #[arg(long)]
    pub types: bool,
}

#[derive(Args)]
pub struct GraphArgs {
    /// Only show dependencies of this package
    #[arg(long)]
    pub package: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dry_run_conflicts_with_check() {
        assert!(Cli::try_parse_from(["pypants", "generate", "--dry-run", "--check"]).is_err());
        assert!(Cli::try_parse_from(["pypants", "generate", "-j", "4", "--root", "/tmp"]).is_ok());
    }
}
