//! Writing backend-proposed files into a workspace
//!
//! Filenames come from the backend and are untrusted. A name is accepted only
//! if it is relative, contains no `..` segment, and still resolves under the
//! workspace root once joined. Existing directories along the way are
//! canonicalized before anything is created, so a symlink cannot redirect
//! the write.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::tools::CreateFileRequest;

/// Resolve `filename` under `root`, rejecting anything that could escape it.
pub fn resolve_in_workspace(root: &Path, filename: &str) -> Result<PathBuf> {
    if filename.trim().is_empty() {
        return Err(Error::UnsafePath("filename cannot be empty".to_string()));
    }

    let normalized = filename.replace('\\', "/");
    if is_absolute(&normalized) {
        return Err(Error::UnsafePath(format!(
            "absolute paths are not allowed: {}",
            filename
        )));
    }

    let segments: Vec<&str> = normalized
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect();

    if segments.iter().any(|seg| *seg == "..") {
        return Err(Error::UnsafePath(format!(
            "path traversal (..) is not allowed: {}",
            filename
        )));
    }
    if segments.is_empty() {
        return Err(Error::UnsafePath(format!(
            "filename has no path components: {}",
            filename
        )));
    }

    let path = segments
        .iter()
        .fold(root.to_path_buf(), |acc, seg| acc.join(seg));

    if !path.starts_with(root) {
        return Err(Error::UnsafePath(format!(
            "path is outside workspace: {}",
            filename
        )));
    }

    Ok(path)
}

/// Unix root, Windows drive letter, or UNC prefix
fn is_absolute(normalized: &str) -> bool {
    let bytes = normalized.as_bytes();
    normalized.starts_with('/')
        || Path::new(normalized).is_absolute()
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Write a `create_file` request into the workspace, creating parent directories.
///
/// Every directory on the way that already exists must canonicalize to a
/// location under the root, and this is checked before anything is created.
/// An existing symlink at the target itself is refused.
///
/// Returns the path that was written.
pub fn write_workspace_file(root: &Path, request: &CreateFileRequest) -> Result<PathBuf> {
    let path = resolve_in_workspace(root, &request.filename)?;
    let canonical_root = root.canonicalize()?;
    let outside = || Error::UnsafePath(format!("path is outside workspace: {}", request.filename));

    if let Some(parent) = path.parent() {
        let relative = parent.strip_prefix(root).map_err(|_| outside())?;
        let mut current = root.to_path_buf();
        for component in relative.components() {
            current.push(component);
            match std::fs::symlink_metadata(&current) {
                Ok(_) => {
                    if !current.canonicalize()?.starts_with(&canonical_root) {
                        return Err(outside());
                    }
                }
                // nothing below a missing directory exists yet
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
                Err(e) => return Err(e.into()),
            }
        }
        std::fs::create_dir_all(parent)?;
    }

    match std::fs::symlink_metadata(&path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(Error::UnsafePath(format!(
                "refusing to write through a symlink: {}",
                request.filename
            )));
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    std::fs::write(&path, &request.content)?;
    tracing::info!(path = %path.display(), bytes = request.content.len(), "Wrote workspace file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(filename: &str) -> CreateFileRequest {
        CreateFileRequest {
            filename: filename.to_string(),
            content: "# Onboarding\n".to_string(),
        }
    }

    #[test]
    fn test_resolves_nested_relative_path() {
        let root = Path::new("/work");
        let path = resolve_in_workspace(root, "docs/./guides//intro.md").unwrap();
        assert_eq!(path, PathBuf::from("/work/docs/guides/intro.md"));
    }

    #[test]
    fn test_backslashes_are_separators() {
        let path = resolve_in_workspace(Path::new("/work"), r"docs\intro.md").unwrap();
        assert_eq!(path, PathBuf::from("/work/docs/intro.md"));
    }

    #[test]
    fn test_rejects_unsafe_names() {
        let root = Path::new("/work");
        for name in [
            "",
            "   ",
            "/etc/passwd",
            r"C:\Windows\system.ini",
            r"\\server\share\x",
            "../escape.md",
            "docs/../../escape.md",
            r"docs\..\..\escape.md",
            "./.",
        ] {
            let err = resolve_in_workspace(root, name).unwrap_err();
            assert!(matches!(err, Error::UnsafePath(_)), "accepted {name:?}");
        }
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = write_workspace_file(dir.path(), &request("docs/ONBOARDING.md")).unwrap();

        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Onboarding\n");
    }

    #[test]
    fn test_write_rejects_traversal_without_touching_disk() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("ws");
        std::fs::create_dir(&root).unwrap();

        assert!(write_workspace_file(&root, &request("../outside.md")).is_err());
        assert!(!dir.path().join("outside.md").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_rejects_symlinked_escape() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("ws");
        let outside = dir.path().join("outside");
        std::fs::create_dir(&root).unwrap();
        std::fs::create_dir(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        assert!(write_workspace_file(&root, &request("link/file.md")).is_err());
        assert!(!outside.join("file.md").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_rejects_symlinked_escape_before_creating_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("ws");
        let outside = dir.path().join("outside");
        std::fs::create_dir(&root).unwrap();
        std::fs::create_dir(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        let err = write_workspace_file(&root, &request("link/newdir/f.md")).unwrap_err();
        assert!(matches!(err, Error::UnsafePath(_)));
        assert!(!outside.join("newdir").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_refuses_existing_file_symlink() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("ws");
        std::fs::create_dir(&root).unwrap();
        let target = dir.path().join("secret.txt");
        std::fs::write(&target, "original").unwrap();
        std::os::unix::fs::symlink(&target, root.join("notes.md")).unwrap();

        let err = write_workspace_file(&root, &request("notes.md")).unwrap_err();
        assert!(matches!(err, Error::UnsafePath(_)));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "original");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_follows_symlinked_dir_inside_workspace() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("ws");
        std::fs::create_dir_all(root.join("real")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

        write_workspace_file(&root, &request("alias/sub/f.md")).unwrap();
        assert!(root.join("real/sub/f.md").exists());
    }
}
