//! In-memory view of a bundle's contents.
//!
//! A package is a set of resources keyed by `/`-separated path plus a
//! directory index mapping each directory to the names of its direct
//! entries. Packages are loaded from a compiled output directory or from a
//! packaged artifact (`.tar`, `.tar.gz`, `.tgz`).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use walkdir::WalkDir;

use crate::core::manifest::{Manifest, MANIFEST_PATH};
use crate::util::fs::{is_contained, relative_path};

/// Directory index key for resources at the package root.
pub const ROOT_DIR: &str = "/";

#[derive(Debug, Clone)]
enum Content {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// A single file inside a package.
#[derive(Debug, Clone)]
pub struct Resource {
    content: Content,
    last_modified: u64,
}

impl Resource {
    /// An in-memory resource. Its timestamp is 0 (not materialized).
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Resource {
            content: Content::Bytes(bytes.into()),
            last_modified: 0,
        }
    }

    /// A resource backed by a file on disk, stamped with its mtime.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let last_modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Resource {
            content: Content::File(path),
            last_modified,
        }
    }

    /// Override the timestamp.
    pub fn with_last_modified(mut self, last_modified: u64) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// Seconds since the epoch, or 0 if the resource only exists in memory.
    pub fn last_modified(&self) -> u64 {
        self.last_modified
    }

    /// Read the full content.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        match &self.content {
            Content::Bytes(bytes) => Ok(bytes.clone()),
            Content::File(path) => fs::read(path),
        }
    }

    /// Write the content to `destination`, creating parent directories.
    pub fn write_to(&self, destination: &Path) -> io::Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        match &self.content {
            Content::Bytes(bytes) => fs::write(destination, bytes),
            Content::File(path) => fs::copy(path, destination).map(|_| ()),
        }
    }
}

/// Split a resource path into (directory key, entry name).
fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) if !dir.is_empty() => (dir, name),
        Some((_, name)) => (ROOT_DIR, name),
        None => (ROOT_DIR, path),
    }
}

/// Bundle contents plus its attached manifest.
#[derive(Debug, Clone, Default)]
pub struct Package {
    resources: BTreeMap<String, Resource>,
    directories: BTreeMap<String, BTreeSet<String>>,
    manifest: Manifest,
}

impl Package {
    /// Create an empty package.
    pub fn new() -> Self {
        Package::default()
    }

    /// Load a directory tree or a tarball.
    ///
    /// If the contents hold `META-INF/MANIFEST.MF` it becomes the package's
    /// manifest.
    pub fn load(location: &Path) -> Result<Self> {
        let mut package = if location.is_dir() {
            Self::load_dir(location)?
        } else if location.is_file() {
            Self::load_archive(location)?
        } else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file or directory: {}", location.display()),
            )
            .into());
        };

        if let Some(resource) = package.resource(MANIFEST_PATH) {
            let bytes = resource
                .read()
                .with_context(|| format!("failed to read {} in {}", MANIFEST_PATH, location.display()))?;
            let text = String::from_utf8_lossy(&bytes);
            package.manifest = Manifest::parse(&text)
                .with_context(|| format!("invalid {} in {}", MANIFEST_PATH, location.display()))?;
        }

        Ok(package)
    }

    fn load_dir(root: &Path) -> Result<Self> {
        let mut package = Package::new();

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
            let rel = relative_path(root, entry.path());
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                package.add_directory(&rel);
            } else {
                package.put_resource(rel, Resource::from_file(entry.path()));
            }
        }

        Ok(package)
    }

    fn load_archive(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let file =
            fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Self::read_tar(tar::Archive::new(GzDecoder::new(file)), path)
        } else if name.ends_with(".tar") {
            Self::read_tar(tar::Archive::new(file), path)
        } else {
            bail!(
                "unsupported artifact format: {} (expected .tar, .tar.gz or .tgz)",
                path.display()
            )
        }
    }

    fn read_tar<R: Read>(mut archive: tar::Archive<R>, path: &Path) -> Result<Self> {
        let mut package = Package::new();

        for entry in archive
            .entries()
            .with_context(|| format!("failed to read archive: {}", path.display()))?
        {
            let mut entry =
                entry.with_context(|| format!("failed to read archive: {}", path.display()))?;
            let entry_path = entry.path()?.to_string_lossy().replace('\\', "/");
            let entry_path = entry_path.trim_start_matches("./").trim_matches('/').to_string();
            if entry_path.is_empty() {
                continue;
            }
            if !is_contained(&entry_path) {
                tracing::warn!(
                    "skipping archive entry outside the bundle root: {} in {}",
                    entry_path,
                    path.display()
                );
                continue;
            }

            if entry.header().entry_type().is_dir() {
                package.add_directory(&entry_path);
                continue;
            }

            let mtime = entry.header().mtime().unwrap_or(0);
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .with_context(|| format!("failed to extract {} from {}", entry_path, path.display()))?;

            package.put_resource(entry_path, Resource::from_bytes(bytes).with_last_modified(mtime));
        }

        Ok(package)
    }

    /// Register a directory (and its ancestors) in the index.
    pub fn add_directory(&mut self, dir: &str) {
        let dir = dir.trim_matches('/');
        if dir.is_empty() {
            self.directories.entry(ROOT_DIR.to_string()).or_default();
            return;
        }

        let mut current = dir;
        loop {
            if self.directories.contains_key(current) {
                break;
            }
            self.directories.insert(current.to_string(), BTreeSet::new());
            match current.rsplit_once('/') {
                Some((parent, _)) if !parent.is_empty() => current = parent,
                _ => break,
            }
        }
    }

    /// Add or replace a resource.
    pub fn put_resource(&mut self, path: impl Into<String>, resource: Resource) {
        let path = path.into().trim_start_matches('/').to_string();
        let (dir, name) = split_path(&path);

        if dir != ROOT_DIR {
            self.add_directory(dir);
        }
        self.directories
            .entry(dir.to_string())
            .or_default()
            .insert(name.to_string());

        self.resources.insert(path, resource);
    }

    /// Look up a resource by path.
    pub fn resource(&self, path: &str) -> Option<&Resource> {
        self.resources.get(path.trim_start_matches('/'))
    }

    /// All resources, ordered by path.
    pub fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(p, r)| (p.as_str(), r))
    }

    /// The directory index: directory key to direct entry names.
    pub fn directories(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.directories
    }

    /// Direct entries of a directory as (entry name, resource) pairs.
    ///
    /// Returns `None` if the directory is not in the index.
    pub fn directory(&self, dir: &str) -> Option<Vec<(&str, &Resource)>> {
        let key = match dir.trim_matches('/') {
            "" => ROOT_DIR,
            trimmed => trimmed,
        };
        let names = self.directories.get(key)?;

        Some(
            names
                .iter()
                .filter_map(|name| {
                    let path = if key == ROOT_DIR {
                        name.clone()
                    } else {
                        format!("{}/{}", key, name)
                    };
                    self.resources.get(&path).map(|r| (name.as_str(), r))
                })
                .collect(),
        )
    }

    /// The attached manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Replace the attached manifest.
    pub fn set_manifest(&mut self, manifest: Manifest) {
        self.manifest = manifest;
    }

    pub fn manifest_mut(&mut self) -> &mut Manifest {
        &mut self.manifest
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
