//! The per-invocation build request and its `Bundle.toml` form.
//!
//! ```toml
//! [project]
//! group = "org.example"
//! name = "demo"
//! version = "1.0-SNAPSHOT"
//! packaging = "bundle"
//! output-directory = "target/classes"
//!
//! [project.manifest-entries]
//! Implementation-Title = "Demo"
//!
//! [instructions]
//! Export-Package = "org.example.api"
//! Embed-Dependency = "*;scope=compile"
//!
//! [properties]
//! -failok = "true"
//!
//! [[dependencies]]
//! artifact = "commons-lang"
//! version = "2.6"
//! file = "lib/commons-lang-2.6.jar"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::core::instructions::Instructions;

/// File name of the build request.
pub const REQUEST_FILE: &str = "Bundle.toml";

fn default_packaging() -> String {
    "jar".to_string()
}

fn default_scope() -> String {
    "compile".to_string()
}

/// Project metadata supplied by the build unit.
#[derive(Debug, Clone)]
pub struct ProjectMetadata {
    pub group: Option<String>,
    pub name: String,
    pub version: String,
    /// Artifact type, e.g. `jar` or `bundle`
    pub packaging: String,
    pub description: Option<String>,
    /// Compiled output directory
    pub output_directory: Option<PathBuf>,
    /// Packaged artifact produced by the build unit
    pub artifact: Option<PathBuf>,
    /// Headers computed by the build unit itself
    pub manifest_entries: Instructions,
}

impl ProjectMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        ProjectMetadata {
            group: None,
            name: name.into(),
            version: version.into(),
            packaging: default_packaging(),
            description: None,
            output_directory: None,
            artifact: None,
            manifest_entries: Instructions::new(),
        }
    }

    /// `group:name:packaging:version`, for log messages.
    pub fn coordinates(&self) -> String {
        match &self.group {
            Some(group) => format!("{}:{}:{}:{}", group, self.name, self.packaging, self.version),
            None => format!("{}:{}:{}", self.name, self.packaging, self.version),
        }
    }
}

/// A dependency of the build unit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dependency {
    #[serde(default)]
    pub group: Option<String>,
    pub artifact: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Resolved file, if the dependency has been fetched
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub optional: bool,
}

impl Dependency {
    pub fn new(artifact: impl Into<String>) -> Self {
        Dependency {
            group: None,
            artifact: artifact.into(),
            version: None,
            scope: default_scope(),
            file: None,
            optional: false,
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

/// Everything one manifest invocation needs. Never mutated once built.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Directory relative paths were resolved against
    pub base_dir: PathBuf,
    pub project: ProjectMetadata,
    pub dependencies: Vec<Dependency>,
    /// Build-unit instructions for the analyser
    pub instructions: Instructions,
    /// Free-form properties, overridden by instructions
    pub properties: Instructions,
    pub classpath: Vec<PathBuf>,
}

impl BuildRequest {
    pub fn new(base_dir: impl Into<PathBuf>, project: ProjectMetadata) -> Self {
        BuildRequest {
            base_dir: base_dir.into(),
            project,
            dependencies: Vec::new(),
            instructions: Instructions::new(),
            properties: Instructions::new(),
            classpath: Vec::new(),
        }
    }

    /// Load a request file. Relative paths resolve against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read build request: {}", path.display()))?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::parse(&contents, &base_dir)
            .with_context(|| format!("failed to parse build request: {}", path.display()))
    }

    /// Parse request text.
    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self> {
        let raw: RawRequest = toml::from_str(contents)?;
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base_dir.join(p) };

        let project = ProjectMetadata {
            group: raw.project.group,
            name: raw.project.name,
            version: raw.project.version,
            packaging: raw.project.packaging,
            description: raw.project.description,
            output_directory: raw.project.output_directory.map(resolve),
            artifact: raw.project.artifact.map(resolve),
            manifest_entries: table_to_instructions(raw.project.manifest_entries, "manifest-entries")?,
        };

        let dependencies = raw
            .dependencies
            .into_iter()
            .map(|mut dep| {
                dep.file = dep.file.map(resolve);
                dep
            })
            .collect();

        Ok(BuildRequest {
            base_dir: base_dir.to_path_buf(),
            project,
            dependencies,
            instructions: table_to_instructions(raw.instructions, "instructions")?,
            properties: table_to_instructions(raw.properties, "properties")?,
            classpath: raw.classpath.into_iter().map(resolve).collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawRequest {
    project: RawProject,
    #[serde(default)]
    instructions: toml::Table,
    #[serde(default)]
    properties: toml::Table,
    #[serde(default)]
    classpath: Vec<PathBuf>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawProject {
    #[serde(default)]
    group: Option<String>,
    name: String,
    version: String,
    #[serde(default = "default_packaging")]
    packaging: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    output_directory: Option<PathBuf>,
    #[serde(default)]
    artifact: Option<PathBuf>,
    #[serde(default)]
    manifest_entries: toml::Table,
}

fn table_to_instructions(table: toml::Table, section: &str) -> Result<Instructions> {
    let mut instructions = Instructions::new();

    for (key, value) in table {
        let value = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            other => bail!(
                "`{}` in [{}] must be a string, found {}",
                key,
                section,
                other.type_str()
            ),
        };
        instructions.insert(key, value);
    }

    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"
classpath = ["lib/api.jar"]

[project]
group = "org.example"
name = "demo"
version = "1.0-SNAPSHOT"
packaging = "bundle"
output-directory = "target/classes"

[project.manifest-entries]
Implementation-Title = "Demo"
Implementation-Build = 42

[instructions]
Private-Package = "org.example.impl"
Export-Package = "org.example.api"
-failok = true

[[dependencies]]
artifact = "commons-lang"
version = "2.6"
file = "lib/commons-lang-2.6.jar"
"#;

    #[test]
    fn test_parse_request() {
        let req = BuildRequest::parse(REQUEST, Path::new("/work")).unwrap();

        assert_eq!(req.project.coordinates(), "org.example:demo:bundle:1.0-SNAPSHOT");
        assert_eq!(
            req.project.output_directory.as_deref(),
            Some(Path::new("/work/target/classes"))
        );
        assert_eq!(req.project.manifest_entries.get("Implementation-Build"), Some("42"));
        assert_eq!(req.classpath, vec![PathBuf::from("/work/lib/api.jar")]);
        assert_eq!(req.dependencies[0].scope, "compile");
        assert_eq!(
            req.dependencies[0].file.as_deref(),
            Some(Path::new("/work/lib/commons-lang-2.6.jar"))
        );
    }

    #[test]
    fn test_instruction_order_is_preserved() {
        let req = BuildRequest::parse(REQUEST, Path::new("/work")).unwrap();
        let keys: Vec<_> = req.instructions.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Private-Package", "Export-Package", "-failok"]);
        assert_eq!(req.instructions.get("-failok"), Some("true"));
    }

    #[test]
    fn test_rejects_table_values() {
        let text = "[project]\nname = \"a\"\nversion = \"1\"\n[instructions]\nX = { a = 1 }\n";
        assert!(BuildRequest::parse(text, Path::new(".")).is_err());
    }
}
