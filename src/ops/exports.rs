//! Default `Export-Package` list computed from package contents.

use crate::core::manifest::{META_INF, OSGI_OPT};
use crate::core::package::{Package, ROOT_DIR};

fn is_reserved(dir: &str, root: &str) -> bool {
    dir == root || dir.strip_prefix(root).is_some_and(|rest| rest.starts_with('/'))
}

/// Dotted names of the directories that hold at least one resource.
///
/// Metadata (`META-INF`), opaque resources (`OSGI-OPT`) and the package root
/// are never included. Order follows the directory index.
pub fn exportable_packages(package: &Package) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for (dir, entries) in package.directories() {
        if entries.is_empty() {
            continue;
        }
        if is_reserved(dir, META_INF) || is_reserved(dir, OSGI_OPT) || dir == ROOT_DIR {
            continue;
        }

        let name = dir.strip_suffix('/').unwrap_or(dir).replace('/', ".");
        if !names.contains(&name) {
            names.push(name);
        }
    }

    names
}

/// Comma-joined default export list. Empty when nothing qualifies.
pub fn calculate_exports_from_contents(package: &Package) -> String {
    exportable_packages(package).join(",")
}
