//! `manifold exports` command

use anyhow::{Context, Result};

use crate::cli::ExportsArgs;
use manifold::core::Package;
use manifold::ops::calculate_exports_from_contents;

pub fn execute(args: ExportsArgs) -> Result<()> {
    let package = Package::load(&args.path)
        .with_context(|| format!("failed to load {}", args.path.display()))?;

    println!("{}", calculate_exports_from_contents(&package));

    Ok(())
}
