//! Built-in pass-through analyser.
//!
//! `BasicEngine` does not inspect class files. Header-shaped instructions
//! become manifest headers, `Export-Package` wildcards expand against the
//! package's directories, and `Include-Resource` is honoured on a full
//! build. Malformed header values are reported as errors; instructions that
//! match no content are reported as warnings.

use std::path::{Path, PathBuf};

use anyhow::Result;
use glob::Pattern;

use crate::core::header::{parse_header, split_clauses};
use crate::core::manifest::{headers, is_valid_header_name, Manifest, MANIFEST_PATH};
use crate::core::package::{Package, Resource};
use crate::core::{BuildRequest, Instructions};
use crate::engine::Analyzer;
use crate::ops::exports::exportable_packages;

/// Instructions that configure the build but never appear as headers.
const BUILD_ONLY: &[&str] = &[
    headers::INCLUDE_RESOURCE,
    headers::EMBED_DEPENDENCY,
    headers::EMBED_DIRECTORY,
    headers::MERGE_HEADERS,
];

/// Pass-through analysis engine.
#[derive(Debug, Default)]
pub struct BasicEngine {
    properties: Instructions,
    package: Package,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl BasicEngine {
    pub fn new() -> Self {
        BasicEngine::default()
    }

    fn basedir(&self) -> PathBuf {
        self.properties
            .get(headers::BASEDIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn expand_exports(&mut self, value: &str) -> String {
        let packages = exportable_packages(&self.package);
        let mut clauses: Vec<String> = Vec::new();

        for clause in split_clauses(value).unwrap_or_default() {
            let (key, params) = match clause.find(';') {
                Some(idx) => (&clause[..idx], &clause[idx..]),
                None => (clause, ""),
            };
            let key = key.trim();

            if key.contains(['*', '?', '[']) {
                let matched: Vec<&String> = match Pattern::new(key) {
                    Ok(pattern) => packages.iter().filter(|p| pattern.matches(p)).collect(),
                    Err(e) => {
                        self.errors
                            .push(format!("Export-Package: invalid pattern `{}`: {}", key, e.msg));
                        continue;
                    }
                };
                if matched.is_empty() {
                    self.warnings
                        .push(format!("Export-Package: `{}` matches no package", key));
                }
                for name in matched {
                    let expanded = format!("{}{}", name, params);
                    if !clauses.contains(&expanded) {
                        clauses.push(expanded);
                    }
                }
            } else {
                if !packages.iter().any(|p| p == key) {
                    self.warnings
                        .push(format!("Export-Package: `{}` has no content in the bundle", key));
                }
                clauses.push(clause.to_string());
            }
        }

        clauses.join(",")
    }

    fn check_components(&mut self, value: &str) {
        let Ok(clauses) = parse_header(value) else {
            return;
        };
        for clause in clauses {
            let root = clause.key.trim_matches('/');
            if root.contains('*') {
                continue;
            }
            let is_dir = self
                .package
                .directory(root)
                .is_some_and(|entries| !entries.is_empty());
            if !is_dir && self.package.resource(root).is_none() {
                self.warnings
                    .push(format!("Service-Component: `{}` not found in the bundle", root));
            }
        }
    }

    fn include_resources(&mut self) {
        let Some(value) = self.properties.get(headers::INCLUDE_RESOURCE).map(str::to_string) else {
            return;
        };
        let clauses = match split_clauses(&value) {
            Ok(clauses) => clauses,
            Err(e) => {
                self.errors.push(format!("Include-Resource: {}", e));
                return;
            }
        };
        let basedir = self.basedir();

        for clause in clauses {
            let spec = clause.split(';').next().unwrap_or(clause).trim();
            let (target, source) = match spec.split_once('=') {
                Some((target, source)) => (Some(target.trim()), source.trim()),
                None => (None, spec),
            };

            let source_path = basedir.join(source);
            if source_path.is_file() {
                let target = match target {
                    Some(t) => t.to_string(),
                    None => file_name(&source_path),
                };
                self.package
                    .put_resource(target, Resource::from_file(&source_path));
            } else if source_path.is_dir() {
                match Package::load(&source_path) {
                    Ok(included) => {
                        let prefix = target.map(|t| t.trim_matches('/')).unwrap_or("");
                        for (path, resource) in included.resources() {
                            let path = if prefix.is_empty() {
                                path.to_string()
                            } else {
                                format!("{}/{}", prefix, path)
                            };
                            self.package.put_resource(path, resource.clone());
                        }
                    }
                    Err(e) => self
                        .errors
                        .push(format!("Include-Resource: `{}`: {:#}", source, e)),
                }
            } else {
                self.errors.push(format!(
                    "Include-Resource: `{}` not found (resolved to {})",
                    source,
                    source_path.display()
                ));
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Analyzer for BasicEngine {
    fn load(&mut self, location: &Path) -> Result<()> {
        tracing::debug!("loading {}", location.display());
        self.package = Package::load(location)?;
        Ok(())
    }

    fn set_property(&mut self, key: &str, value: &str) {
        self.properties.insert(key, value);
    }

    fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    fn package(&self) -> &Package {
        &self.package
    }

    fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    fn calculate_manifest(&mut self) -> Result<Manifest> {
        let mut manifest = Manifest::new();
        manifest.insert(headers::MANIFEST_VERSION, "1.0");
        manifest.insert(headers::BUNDLE_MANIFESTVERSION, "2");
        manifest.insert(
            headers::CREATED_BY,
            concat!("manifold ", env!("CARGO_PKG_VERSION")),
        );

        if !self.properties.contains(headers::BUNDLE_SYMBOLICNAME) {
            self.errors
                .push("Bundle-SymbolicName is not set".to_string());
        }

        let properties: Vec<(String, String)> = self
            .properties
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        for (key, value) in properties {
            if !is_valid_header_name(&key) || BUILD_ONLY.contains(&key.as_str()) {
                continue;
            }
            if let Err(e) = split_clauses(&value) {
                self.errors.push(format!("{}: {}", key, e));
                continue;
            }

            let value = match key.as_str() {
                headers::EXPORT_PACKAGE => self.expand_exports(&value),
                headers::SERVICE_COMPONENT => {
                    self.check_components(&value);
                    value
                }
                _ => value,
            };

            if !value.trim().is_empty() {
                manifest.insert(key, value);
            }
        }

        self.package.set_manifest(manifest.clone());
        Ok(manifest)
    }

    fn merge_manifest(&mut self, existing: &Manifest) {
        for (name, value) in existing.iter() {
            if !self.properties.contains(name) {
                self.properties.insert(name, value);
            }
        }
    }

    fn build(&mut self) -> Result<()> {
        self.include_resources();
        let manifest = self.calculate_manifest()?;
        self.package.put_resource(
            MANIFEST_PATH,
            Resource::from_bytes(manifest.render(false)),
        );
        Ok(())
    }

    fn rebuild(&mut self, request: &BuildRequest) -> Result<()> {
        self.package = match &request.project.output_directory {
            Some(dir) if dir.is_dir() => Package::load(dir)?,
            _ => Package::new(),
        };
        self.build()
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn close(&mut self) -> Result<()> {
        self.package = Package::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn engine_with(resources: &[&str]) -> BasicEngine {
        let mut engine = BasicEngine::new();
        for path in resources {
            engine
                .package_mut()
                .put_resource(*path, Resource::from_bytes("x"));
        }
        engine.set_property(headers::BUNDLE_SYMBOLICNAME, "org.example.demo");
        engine
    }

    #[test]
    fn test_headers_pass_through() {
        let mut engine = engine_with(&["org/example/api/Api.class"]);
        engine.set_property("Bundle-Name", "Demo");
        engine.set_property("-failok", "true");
        engine.set_property(headers::EMBED_DEPENDENCY, "*");

        let manifest = engine.calculate_manifest().unwrap();
        assert_eq!(manifest.get("Bundle-Name"), Some("Demo"));
        assert_eq!(manifest.get("Manifest-Version"), Some("1.0"));
        assert!(!manifest.contains("-failok"));
        assert!(!manifest.contains(headers::EMBED_DEPENDENCY));
        assert_eq!(engine.package().manifest(), &manifest);
        assert!(engine.errors().is_empty());
    }

    #[test]
    fn test_export_wildcards_expand() {
        let mut engine = engine_with(&[
            "org/example/api/Api.class",
            "org/example/api/spi/Spi.class",
            "org/example/impl/Impl.class",
        ]);
        engine.set_property(headers::EXPORT_PACKAGE, "org.example.api*;version=1.0, com.none.*");

        let manifest = engine.calculate_manifest().unwrap();
        assert_eq!(
            manifest.get(headers::EXPORT_PACKAGE),
            Some("org.example.api;version=1.0,org.example.api.spi;version=1.0")
        );
        assert_eq!(engine.warnings().len(), 1);
    }

    #[test]
    fn test_empty_export_list_omits_header() {
        let mut engine = engine_with(&[]);
        engine.set_property(headers::EXPORT_PACKAGE, "");
        let manifest = engine.calculate_manifest().unwrap();
        assert!(!manifest.contains(headers::EXPORT_PACKAGE));
    }

    #[test]
    fn test_malformed_header_is_an_error() {
        let mut engine = engine_with(&[]);
        engine.set_property(headers::IMPORT_PACKAGE, "org.a;version=\"[1,2)");
        engine.calculate_manifest().unwrap();
        assert_eq!(engine.errors().len(), 1);
        assert!(engine.errors()[0].contains("Import-Package"));
    }

    #[test]
    fn test_missing_symbolic_name_is_an_error() {
        let mut engine = BasicEngine::new();
        engine.calculate_manifest().unwrap();
        assert_eq!(engine.errors(), ["Bundle-SymbolicName is not set".to_string()]);
    }

    #[test]
    fn test_merge_manifest_does_not_override_instructions() {
        let mut engine = engine_with(&[]);
        engine.set_property("Bundle-Name", "Fresh");

        let mut existing = Manifest::new();
        existing.insert("Bundle-Name", "Old");
        existing.insert("X-Curated", "yes");
        engine.merge_manifest(&existing);

        assert_eq!(engine.property("Bundle-Name"), Some("Fresh"));
        assert_eq!(engine.property("X-Curated"), Some("yes"));
    }

    #[test]
    fn test_build_includes_resources() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("util.jar"), "jar").unwrap();

        let mut engine = engine_with(&[]);
        engine.set_property(headers::BASEDIR, &tmp.path().display().to_string());
        engine.set_property(headers::INCLUDE_RESOURCE, "lib/util.jar=util.jar, missing.txt");
        engine.build().unwrap();

        assert!(engine.package().resource("lib/util.jar").is_some());
        assert!(engine.package().resource(MANIFEST_PATH).is_some());
        assert_eq!(engine.errors().len(), 1);
        assert!(engine.errors()[0].contains("missing.txt"));
    }

    #[test]
    fn test_close_releases_package() {
        let mut engine = BasicEngine::new();
        engine
            .package_mut()
            .put_resource("a/b.txt", Resource::from_bytes("b"));
        engine.close().unwrap();
        assert!(engine.package().is_empty());
    }
}
