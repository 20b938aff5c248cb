//! Test fixtures for build requests and packaged artifacts.

use std::fs::File;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::{BuildRequest, ProjectMetadata};

/// A request for `org.example:demo:1.0-SNAPSHOT` rooted at `base_dir`,
/// with neither output directory nor artifact set.
pub fn request_in(base_dir: &Path) -> BuildRequest {
    let mut project = ProjectMetadata::new("demo", "1.0-SNAPSHOT");
    project.group = Some("org.example".to_string());
    BuildRequest::new(base_dir, project)
}

fn append_entries<W: std::io::Write>(builder: &mut tar::Builder<W>, entries: &[(&str, &str)]) {
    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_700_000_000);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
}

/// Write a plain tar archive holding `entries` (path, content).
pub fn write_tarball(path: &Path, entries: &[(&str, &str)]) {
    let mut builder = tar::Builder::new(File::create(path).unwrap());
    append_entries(&mut builder, entries);
    builder.finish().unwrap();
}

/// Write a gzip-compressed tar archive holding `entries`.
pub fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
    let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_entries(&mut builder, entries);
    builder.into_inner().unwrap().finish().unwrap();
}
