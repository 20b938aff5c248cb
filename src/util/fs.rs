//! Filesystem utilities.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Replace `path` with `contents` in one step.
///
/// The data goes to a temporary file in the destination directory which is
/// then renamed over `path`, so readers never observe a partial file. Parent
/// directories are created.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Whether `path` is relative and stays below the directory it is joined to.
///
/// Absolute paths, drive prefixes and `..` components are rejected.
pub fn is_contained(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Find `file_name` in `start` or any of its ancestors.
pub fn find_upward(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents_and_replaces() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("a/b/MANIFEST.MF");

        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second");
        let leftovers = fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_find_upward() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("x/y");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("Bundle.toml"), "").unwrap();

        assert_eq!(
            find_upward(&nested, "Bundle.toml"),
            Some(tmp.path().join("Bundle.toml"))
        );
        assert_eq!(find_upward(&nested, "Missing.toml"), None);
    }

    #[test]
    fn test_is_contained() {
        assert!(is_contained("OSGI-INF/component.xml"));
        assert!(is_contained("./a/b"));
        assert!(!is_contained("../escaped.txt"));
        assert!(!is_contained("a/../../b"));
        assert!(!is_contained("/etc/passwd"));
        assert!(!is_contained(""));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/a/b"), Path::new("/a/b/c/d.txt")),
            PathBuf::from("c/d.txt")
        );
    }
}
