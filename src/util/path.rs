//! Path normalization and display helpers.

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components without filesystem access.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                components.pop();
            }
            Component::CurDir => {}
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Absolute form of `path`, anchored at the current directory if relative.
/// Does not touch the file itself.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(_) => normalize(path),
    }
}

/// Canonical (symlink-resolved) path for display, falling back to the
/// absolute path when the file cannot be resolved.
pub fn canonical_display(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| absolute(path))
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_simple() {
        assert_eq!(normalize(Path::new("/a/b/c")), PathBuf::from("/a/b/c"));
    }

    #[test]
    fn test_normalize_dotdot() {
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
    }

    #[test]
    fn test_normalize_dot() {
        assert_eq!(normalize(Path::new("/a/./b")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        assert_eq!(
            absolute(Path::new("/srv/./standalone/../domain/x.properties")),
            PathBuf::from("/srv/domain/x.properties")
        );
    }

    #[test]
    fn test_absolute_anchors_relative_paths() {
        let resolved = absolute(Path::new("configuration/mgmt-users.properties"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("configuration/mgmt-users.properties"));
    }

    #[test]
    fn test_canonical_display_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mgmt-users.properties");
        fs::write(&file, "").unwrap();
        let dotted = dir.path().join(".").join("mgmt-users.properties");
        let expected = fs::canonicalize(&file).unwrap().display().to_string();
        assert_eq!(canonical_display(&dotted), expected);
    }

    #[test]
    fn test_canonical_display_missing_file_falls_back() {
        assert_eq!(
            canonical_display(Path::new("/nonexistent/dir/users.properties")),
            "/nonexistent/dir/users.properties"
        );
    }
}
