//! pypants CLI - BUILD file generator for Python monorepos

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("pypants=debug")
    } else if cli.quiet {
        EnvFilter::new("pypants=error")
    } else {
        EnvFilter::new("pypants=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let global = cli.global();
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(&global, args),
        Commands::Resolve(args) => commands::resolve::execute(&global, args),
        Commands::List(args) => commands::list::execute(&global, args),
        Commands::Graph(args) => commands::graph::execute(&global, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
