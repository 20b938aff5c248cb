//! Implementation of `manifold manifest`.
//!
//! Drives an [`Analyzer`] over the build unit's output and writes
//! `MANIFEST.MF`. Either the whole bundle is rebuilt in memory, or the
//! compiled output (directory or packaged artifact) is analysed with the
//! build-unit instructions layered on top.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::header::union_clauses;
use crate::core::manifest::{headers, Manifest, MANIFEST_FILE, META_INF};
use crate::core::version::to_osgi_version;
use crate::core::{BuildRequest, MergeInstructions, ProjectMetadata};
use crate::engine::Analyzer;
use crate::ops::embed::embed_dependencies;
use crate::ops::errors::ManifestError;
use crate::ops::exports::calculate_exports_from_contents;
use crate::ops::merge::merge_manifests;
use crate::ops::policy::{is_fatal, report_problems};
use crate::ops::scr::export_component_descriptors;
use crate::util::config::ManifestConfig;
use crate::util::fs::{is_contained, write_atomic};

/// Options for manifest generation.
#[derive(Debug, Clone)]
pub struct ManifestOptions {
    /// Directory receiving MANIFEST.MF
    pub manifest_location: PathBuf,

    /// Directory receiving component descriptors
    pub scr_location: PathBuf,

    /// Copy component descriptors named by Service-Component
    pub export_scr: bool,

    /// Write the analysed package back into the output directory
    pub unpack_bundle: bool,

    /// One clause per line for multi-clause headers
    pub nice_manifest: bool,

    /// Rebuild the bundle in memory when the project type allows it
    pub rebuild_bundle: bool,

    /// Project types eligible for an in-memory rebuild
    pub supported_project_types: Vec<String>,
}

impl ManifestOptions {
    /// Options with every switch off.
    pub fn new(manifest_location: impl Into<PathBuf>, scr_location: impl Into<PathBuf>) -> Self {
        ManifestOptions {
            manifest_location: manifest_location.into(),
            scr_location: scr_location.into(),
            export_scr: false,
            unpack_bundle: false,
            nice_manifest: false,
            rebuild_bundle: false,
            supported_project_types: ManifestConfig::default().supported_project_types(),
        }
    }

    /// Build options from configuration.
    ///
    /// Locations default to `<output>/META-INF` and `<output>`, where
    /// `<output>` is the project's output directory (or the request's base
    /// directory). Relative configured paths resolve against the base
    /// directory.
    pub fn from_config(config: &ManifestConfig, request: &BuildRequest) -> Self {
        let base = &request.base_dir;
        let output = request
            .project
            .output_directory
            .clone()
            .unwrap_or_else(|| base.clone());
        let resolve = |p: &PathBuf| if p.is_absolute() { p.clone() } else { base.join(p) };

        ManifestOptions {
            manifest_location: config
                .manifest_location
                .as_ref()
                .map(resolve)
                .unwrap_or_else(|| output.join(META_INF)),
            scr_location: config
                .scr_location
                .as_ref()
                .map(resolve)
                .unwrap_or(output),
            export_scr: config.export_scr.unwrap_or(false),
            unpack_bundle: config.unpack_bundle.unwrap_or(false),
            nice_manifest: config.nice_manifest.unwrap_or(false),
            rebuild_bundle: config.rebuild_bundle.unwrap_or(false),
            supported_project_types: config.supported_project_types(),
        }
    }

    /// `<manifest_location>/MANIFEST.MF`
    pub fn manifest_file(&self) -> PathBuf {
        self.manifest_location.join(MANIFEST_FILE)
    }
}

/// Result of a successful `generate_manifest`.
#[derive(Debug, Clone)]
pub struct ManifestOutcome {
    /// The manifest as written
    pub manifest: Manifest,

    /// Where it was written
    pub manifest_file: PathBuf,

    /// Component descriptors written
    pub descriptors: Vec<PathBuf>,
}

/// Default bundle headers derived from project metadata.
pub fn default_properties(project: &ProjectMetadata) -> Vec<(&'static str, String)> {
    let symbolic_name = match &project.group {
        Some(group) if !project.name.starts_with(group.as_str()) => {
            format!("{}.{}", group, project.name)
        }
        _ => project.name.clone(),
    };

    let mut props = vec![
        (headers::BUNDLE_SYMBOLICNAME, symbolic_name),
        (headers::BUNDLE_NAME, project.name.clone()),
        (headers::BUNDLE_VERSION, to_osgi_version(&project.version)),
    ];
    if let Some(description) = &project.description {
        props.push((headers::BUNDLE_DESCRIPTION, description.clone()));
    }
    props
}

/// Feed request properties, instructions and defaults to the engine.
fn configure<A: Analyzer>(engine: &mut A, request: &BuildRequest) {
    for (key, value) in request.properties.iter() {
        engine.set_property(key, value);
    }
    for (key, value) in request.instructions.iter() {
        engine.set_property(key, value);
    }
    for (key, value) in default_properties(&request.project) {
        if engine.property(key).is_none() {
            engine.set_property(key, &value);
        }
    }

    if !request.classpath.is_empty() && engine.property(headers::CLASSPATH).is_none() {
        let classpath = request
            .classpath
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",");
        engine.set_property(headers::CLASSPATH, &classpath);
    }
    if engine.property(headers::BASEDIR).is_none() {
        engine.set_property(headers::BASEDIR, &request.base_dir.display().to_string());
    }
}

/// Pick the location to analyse. Returns the path and whether it is the
/// compiled output directory.
fn resolve_location(request: &BuildRequest) -> Result<(PathBuf, bool), ManifestError> {
    let project = &request.project;

    if let Some(dir) = &project.output_directory {
        if !dir.exists() {
            tracing::debug!("creating empty output directory {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| ManifestError::io("create directory", dir, e))?;
        }
        return Ok((dir.clone(), true));
    }

    match &project.artifact {
        Some(artifact) if artifact.exists() => Ok((artifact.clone(), false)),
        Some(artifact) => Err(ManifestError::NotFound {
            location: artifact.display().to_string(),
        }),
        None => Err(ManifestError::NotFound {
            location: format!("build output for `{}`", project.coordinates()),
        }),
    }
}

fn apply_dependency_instructions<A: Analyzer>(
    engine: &mut A,
    request: &BuildRequest,
) -> Result<(), ManifestError> {
    let Some(instruction) = engine.property(headers::EMBED_DEPENDENCY).map(str::to_string) else {
        return Ok(());
    };
    let embed_directory = engine.property(headers::EMBED_DIRECTORY).map(str::to_string);

    let embedding = embed_dependencies(&instruction, embed_directory.as_deref(), &request.dependencies)
        .map_err(|e| ManifestError::ConfigurationInvalid {
            errors: vec![format!("Embed-Dependency: {}", e)],
        })?;
    if embedding.is_empty() {
        return Ok(());
    }

    let include = embedding.include_resource.join(",");
    let include = match engine.property(headers::INCLUDE_RESOURCE) {
        Some(existing) => union_clauses(existing, &include),
        None => include,
    };
    engine.set_property(headers::INCLUDE_RESOURCE, &include);

    if engine.property(headers::BUNDLE_CLASSPATH).is_none() {
        let classpath = std::iter::once(".".to_string())
            .chain(embedding.bundle_classpath)
            .collect::<Vec<_>>()
            .join(",");
        engine.set_property(headers::BUNDLE_CLASSPATH, &classpath);
    }

    Ok(())
}

/// Add the build unit's own manifest entries that analysis did not set.
fn merge_project_manifest<A: Analyzer>(engine: &mut A, request: &BuildRequest) {
    let manifest = engine.package_mut().manifest_mut();
    for (name, value) in request.project.manifest_entries.iter() {
        manifest.insert_if_absent(name, value);
    }
}

fn check_problems<A: Analyzer>(engine: &A, request: &BuildRequest) -> Result<(), ManifestError> {
    let label = format!("Manifest {}", request.project.coordinates());
    if !report_problems(&label, engine.errors(), engine.warnings()) {
        return Ok(());
    }

    let failok = engine.property(headers::FAILOK);
    if is_fatal(engine.errors().len(), failok) {
        return Err(ManifestError::ConfigurationInvalid {
            errors: engine.errors().to_vec(),
        });
    }

    tracing::warn!(
        "{}: continuing despite {} error(s) because -failok is set",
        label,
        engine.errors().len()
    );
    Ok(())
}

/// Write package resources into `output`, skipping up-to-date files.
fn unpack<A: Analyzer>(engine: &A, output: &Path) -> Result<usize, ManifestError> {
    let mut written = 0;

    for (path, resource) in engine.package().resources() {
        if !is_contained(path) {
            tracing::warn!("not unpacking `{}`: path leaves {}", path, output.display());
            continue;
        }
        let destination = output.join(path);
        if destination.exists() && resource.last_modified() != 0 {
            continue;
        }
        resource
            .write_to(&destination)
            .map_err(|e| ManifestError::io("unpack", &destination, e))?;
        written += 1;
    }

    tracing::debug!("unpacked {} resource(s) into {}", written, output.display());
    Ok(written)
}

/// Run the analysis for `request`, leaving the result in the engine's package.
pub fn analyze<A: Analyzer>(
    engine: &mut A,
    request: &BuildRequest,
    opts: &ManifestOptions,
) -> Result<(), ManifestError> {
    let project = &request.project;

    if opts.rebuild_bundle && opts.supported_project_types.contains(&project.packaging) {
        tracing::debug!("rebuilding {} in memory", project.coordinates());
        configure(engine, request);
        engine
            .rebuild(request)
            .map_err(|e| ManifestError::from_engine("rebuild bundle for", &request.base_dir, e))?;
        merge_project_manifest(engine, request);
        return check_problems(engine, request);
    }

    let (location, is_output_directory) = resolve_location(request)?;

    configure(engine, request);
    engine
        .load(&location)
        .map_err(|e| ManifestError::from_engine("load", &location, e))?;

    // Packaged artifacts already have their final layout, so their
    // directories make a sensible default export list. Loose output does not.
    if engine.property(headers::EXPORT_PACKAGE).is_none()
        && engine.property(headers::EXPORT_CONTENTS).is_none()
        && engine.property(headers::PRIVATE_PACKAGE).is_none()
        && !is_output_directory
    {
        let exports = calculate_exports_from_contents(engine.package());
        tracing::debug!("default Export-Package: {:?}", exports);
        engine.set_property(headers::EXPORT_PACKAGE, &exports);
    }

    apply_dependency_instructions(engine, request)?;

    if engine.property(headers::EMBED_DEPENDENCY).is_some() && is_output_directory {
        // Embedding needs the dependency content inside the bundle.
        engine
            .build()
            .map_err(|e| ManifestError::from_engine("build bundle from", &location, e))?;
    } else {
        let existing = engine.package().manifest().clone();
        engine.merge_manifest(&existing);
        let manifest = engine
            .calculate_manifest()
            .map_err(|e| ManifestError::from_engine("analyze", &location, e))?;
        engine.package_mut().set_manifest(manifest);
    }

    merge_project_manifest(engine, request);
    check_problems(engine, request)?;

    if opts.unpack_bundle {
        match &project.output_directory {
            Some(output) => {
                unpack(engine, output)?;
            }
            None => tracing::warn!("cannot unpack {}: no output directory", project.coordinates()),
        }
    }

    Ok(())
}

/// Write `manifest` to `output_file` atomically.
pub fn write_manifest_file(
    manifest: &Manifest,
    output_file: &Path,
    nice: bool,
) -> Result<(), ManifestError> {
    tracing::debug!("writing {}", output_file.display());
    write_atomic(output_file, manifest.render(nice).as_bytes())
        .map_err(|e| ManifestError::io("write manifest", output_file, e))
}

fn read_manifest_file(path: &Path) -> Result<Manifest, ManifestError> {
    let text =
        fs::read_to_string(path).map_err(|e| ManifestError::io("read manifest", path, e))?;
    Manifest::parse(&text).map_err(|e| {
        ManifestError::io(
            "read manifest",
            path,
            io::Error::new(io::ErrorKind::InvalidData, e),
        )
    })
}

/// Write the engine's manifest, merging with the file already on disk when
/// a `Merge-Headers` instruction is set. Returns what was written.
pub fn write_manifest<A: Analyzer>(
    engine: &A,
    output_file: &Path,
    nice: bool,
) -> Result<Manifest, ManifestError> {
    let fresh = engine.package().manifest();

    let manifest = match engine.property(headers::MERGE_HEADERS) {
        Some(rules) if output_file.exists() => {
            let instructions =
                MergeInstructions::parse(rules).map_err(|e| ManifestError::ConfigurationInvalid {
                    errors: vec![e.to_string()],
                })?;
            let existing = read_manifest_file(output_file)?;
            merge_manifests(&instructions, &existing, fresh)
        }
        _ => fresh.clone(),
    };

    write_manifest_file(&manifest, output_file, nice)?;
    Ok(manifest)
}

fn service_component<A: Analyzer>(engine: &A) -> Option<&str> {
    engine
        .package()
        .manifest()
        .get(headers::SERVICE_COMPONENT)
        .or_else(|| engine.property(headers::SERVICE_COMPONENT))
}

/// Close the engine, reporting close failures unless an earlier error wins.
fn finish<A: Analyzer, T>(
    engine: &mut A,
    result: Result<T, ManifestError>,
    path: &Path,
) -> Result<T, ManifestError> {
    let closed = engine.close().map_err(|e| {
        let source = e
            .downcast::<io::Error>()
            .unwrap_or_else(|e| io::Error::other(format!("{:#}", e)));
        ManifestError::io("close analyzer for", path, source)
    });

    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!("{}", close_err);
            Err(err)
        }
    }
}

/// Generate the manifest and write it (plus descriptors) to disk.
///
/// The engine is closed before returning, on every path.
pub fn generate_manifest<A: Analyzer>(
    mut engine: A,
    request: &BuildRequest,
    opts: &ManifestOptions,
) -> Result<ManifestOutcome, ManifestError> {
    let manifest_file = opts.manifest_file();

    let result = analyze(&mut engine, request, opts).and_then(|()| {
        let manifest = write_manifest(&engine, &manifest_file, opts.nice_manifest)?;
        let descriptors = if opts.export_scr {
            export_component_descriptors(service_component(&engine), engine.package(), &opts.scr_location)?
        } else {
            Vec::new()
        };

        Ok(ManifestOutcome {
            manifest,
            manifest_file: manifest_file.clone(),
            descriptors,
        })
    });

    finish(&mut engine, result, &manifest_file)
}

/// Compute the manifest without writing it.
///
/// Component descriptors are still exported when `export_scr` is set.
pub fn compute_manifest<A: Analyzer>(
    mut engine: A,
    request: &BuildRequest,
    opts: &ManifestOptions,
) -> Result<Manifest, ManifestError> {
    let result = analyze(&mut engine, request, opts).and_then(|()| {
        if opts.export_scr {
            export_component_descriptors(service_component(&engine), engine.package(), &opts.scr_location)?;
        }
        Ok(engine.package().manifest().clone())
    });

    finish(&mut engine, result, &opts.manifest_file())
}
