//! Export of component descriptors named by the `Service-Component` header.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::header::parse_header;
use crate::core::package::{Package, Resource};
use crate::ops::errors::ManifestError;
use crate::util::fs::is_contained;

fn write_descriptor(resource: &Resource, destination: &Path) -> Result<(), ManifestError> {
    tracing::debug!("writing component descriptor {}", destination.display());
    resource
        .write_to(destination)
        .map_err(|e| ManifestError::io("write component descriptor", destination, e))
}

/// Copy the descriptors named by `service_component` into `scr_location`.
///
/// Each clause key is a root: a directory root copies its direct entries to
/// `scr_location/root/<entry>`, a resource root copies the single resource
/// to `scr_location/root`. Existing files are overwritten. Returns the
/// written paths.
pub fn export_component_descriptors(
    service_component: Option<&str>,
    package: &Package,
    scr_location: &Path,
) -> Result<Vec<PathBuf>, ManifestError> {
    fs::create_dir_all(scr_location)
        .map_err(|e| ManifestError::io("create directory", scr_location, e))?;

    let Some(header) = service_component else {
        return Ok(Vec::new());
    };

    let clauses = parse_header(header).map_err(|e| ManifestError::ConfigurationInvalid {
        errors: vec![format!("Service-Component: {}", e)],
    })?;

    let mut written = Vec::new();

    for clause in clauses {
        let root = clause.key.trim_matches('/');
        if !root.is_empty() && !is_contained(root) {
            tracing::warn!(
                "skipping component descriptor root `{}` outside {}",
                root,
                scr_location.display()
            );
            continue;
        }
        let location = scr_location.join(root);

        match package.directory(root).filter(|entries| !entries.is_empty()) {
            Some(entries) => {
                for (name, resource) in entries {
                    let destination = location.join(name);
                    write_descriptor(resource, &destination)?;
                    written.push(destination);
                }
            }
            None => match package.resource(root) {
                Some(resource) => {
                    write_descriptor(resource, &location)?;
                    written.push(location);
                }
                None => tracing::debug!("no component descriptor found for `{}`", root),
            },
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn descriptors() -> Package {
        let mut pkg = Package::new();
        pkg.put_resource("OSGI-INF/a.xml", Resource::from_bytes("<a/>"));
        pkg.put_resource("OSGI-INF/b.xml", Resource::from_bytes("<b/>"));
        pkg.put_resource("OSGI-INF/extra/c.xml", Resource::from_bytes("<c/>"));
        pkg.put_resource("single/component.xml", Resource::from_bytes("<s/>"));
        pkg
    }

    #[test]
    fn test_exports_directory_and_single_resource() {
        let tmp = TempDir::new().unwrap();
        let pkg = descriptors();

        let written = export_component_descriptors(
            Some("OSGI-INF, single/component.xml, missing.xml"),
            &pkg,
            tmp.path(),
        )
        .unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(fs::read_to_string(tmp.path().join("OSGI-INF/a.xml")).unwrap(), "<a/>");
        assert_eq!(fs::read_to_string(tmp.path().join("OSGI-INF/b.xml")).unwrap(), "<b/>");
        assert!(!tmp.path().join("OSGI-INF/extra").exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join("single/component.xml")).unwrap(),
            "<s/>"
        );
    }

    #[test]
    fn test_export_twice_overwrites_identically() {
        let tmp = TempDir::new().unwrap();
        let pkg = descriptors();
        let target = tmp.path().join("OSGI-INF/a.xml");

        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "stale").unwrap();

        let first = export_component_descriptors(Some("OSGI-INF"), &pkg, tmp.path()).unwrap();
        let content = fs::read_to_string(&target).unwrap();
        let second = export_component_descriptors(Some("OSGI-INF"), &pkg, tmp.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(content, "<a/>");
        assert_eq!(fs::read_to_string(&target).unwrap(), content);
    }

    #[test]
    fn test_no_header_only_creates_location() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("scr");
        let written = export_component_descriptors(None, &Package::new(), &location).unwrap();
        assert!(written.is_empty());
        assert!(location.is_dir());
    }

    #[test]
    fn test_roots_leaving_location_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let location = tmp.path().join("scr");
        let mut pkg = descriptors();
        pkg.put_resource("../leak.xml", Resource::from_bytes("<leak/>"));

        let written =
            export_component_descriptors(Some("../leak.xml, OSGI-INF"), &pkg, &location).unwrap();

        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.starts_with(&location)));
        assert!(!tmp.path().join("leak.xml").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        // A file where a directory is needed.
        fs::write(tmp.path().join("OSGI-INF"), "blocker").unwrap();

        let err = export_component_descriptors(Some("OSGI-INF"), &descriptors(), tmp.path())
            .unwrap_err();
        assert_eq!(err.kind(), crate::ops::errors::ErrorKind::IoFailure);
    }
}
