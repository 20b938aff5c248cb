//! Manifold CLI - bundle manifest generator

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

    let filter = if cli.verbose {
        EnvFilter::new("manifold=debug")
    } else {
        EnvFilter::new("manifold=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Manifest(args) => commands::manifest::execute(args, cli.verbose, cli.no_color),
        Commands::Exports(args) => commands::exports::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
