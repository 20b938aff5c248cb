//! `manifold manifest` command

use std::io::IsTerminal;

use anyhow::{bail, Result};

use crate::cli::ManifestArgs;
use manifold::core::BuildRequest;
use manifold::engine::BasicEngine;
use manifold::ops::{compute_manifest, generate_manifest, ManifestError, ManifestOptions};
use manifold::util::diagnostic::{emit, suggestions, Diagnostic};
use manifold::util::fs::relative_path;
use manifold::util::GlobalContext;

pub fn execute(args: ManifestArgs, verbose: bool, no_color: bool) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);

    let color = !no_color && std::io::stderr().is_terminal();

    let request_path = match &args.request {
        Some(path) => ctx.cwd().join(path),
        None => match ctx.find_request() {
            Ok(path) => path,
            Err(e) => {
                emit(
                    &Diagnostic::error(format!("{:#}", e)).with_suggestion(suggestions::NO_REQUEST),
                    color,
                );
                bail!("no build request found");
            }
        },
    };
    let request = BuildRequest::load(&request_path)?;

    // CLI flags override project config, which overrides global config
    let config = ctx.config(&request.base_dir);
    let mut opts = ManifestOptions::from_config(&config.manifest, &request);
    if let Some(dir) = args.manifest_location {
        opts.manifest_location = ctx.cwd().join(dir);
    }
    if let Some(dir) = args.scr_location {
        opts.scr_location = ctx.cwd().join(dir);
    }
    opts.export_scr |= args.export_scr;
    opts.unpack_bundle |= args.unpack;
    opts.nice_manifest |= args.nice;
    opts.rebuild_bundle |= args.rebuild;

    let coordinates = request.project.coordinates();

    if args.print || args.json {
        let manifest = match compute_manifest(BasicEngine::new(), &request, &opts) {
            Ok(manifest) => manifest,
            Err(e) => return report(e, &coordinates, &ctx, color),
        };

        if args.json {
            let pairs: Vec<(&str, &str)> = manifest.iter().collect();
            println!("{}", serde_json::to_string_pretty(&pairs)?);
        } else {
            print!("{}", manifest.render(opts.nice_manifest));
        }
        return Ok(());
    }

    let outcome = match generate_manifest(BasicEngine::new(), &request, &opts) {
        Ok(outcome) => outcome,
        Err(e) => return report(e, &coordinates, &ctx, color),
    };

    eprintln!(
        "     Wrote {}",
        relative_path(ctx.cwd(), &outcome.manifest_file).display()
    );
    if !outcome.descriptors.is_empty() {
        eprintln!(
            "  Exported {} component descriptor(s) to {}",
            outcome.descriptors.len(),
            relative_path(ctx.cwd(), &opts.scr_location).display()
        );
        if ctx.is_verbose() {
            for path in &outcome.descriptors {
                eprintln!("            {}", relative_path(ctx.cwd(), path).display());
            }
        }
    }

    Ok(())
}

fn report(err: ManifestError, coordinates: &str, ctx: &GlobalContext, color: bool) -> Result<()> {
    emit(&err.to_diagnostic(), color);
    if ctx.is_verbose() {
        tracing::debug!("{:?}", miette::Report::new(err));
    }
    bail!("could not generate manifest for `{}`", coordinates)
}
