//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Manifold - bundle manifest generator for compiled build output
#[derive(Parser)]
#[command(name = "manifold")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate META-INF/MANIFEST.MF for the build unit
    Manifest(ManifestArgs),

    /// Print the default Export-Package list of a directory or artifact
    Exports(ExportsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Path to Bundle.toml (defaults to searching upward from the current directory)
    #[arg(long, env = "MANIFOLD_REQUEST")]
    pub request: Option<PathBuf>,

    /// Directory receiving MANIFEST.MF [default: <output-directory>/META-INF]
    #[arg(long)]
    pub manifest_location: Option<PathBuf>,

    /// Directory receiving component descriptors [default: <output-directory>]
    #[arg(long)]
    pub scr_location: Option<PathBuf>,

    /// Copy the component descriptors named by Service-Component
    #[arg(long)]
    pub export_scr: bool,

    /// Write the analysed bundle content back into the output directory
    #[arg(long)]
    pub unpack: bool,

    /// Put each clause of multi-clause headers on its own line
    #[arg(long)]
    pub nice: bool,

    /// Rebuild the bundle in memory instead of analysing existing output
    #[arg(long)]
    pub rebuild: bool,

    /// Print the manifest to stdout instead of writing it
    #[arg(long)]
    pub print: bool,

    /// Print the manifest as JSON instead of writing it
    #[arg(long, conflicts_with = "print")]
    pub json: bool,
}

#[derive(Args)]
pub struct ExportsArgs {
    /// Directory or .tar/.tar.gz artifact to inspect
    pub path: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
