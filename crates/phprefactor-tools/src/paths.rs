//! Path utilities: resolving settings paths against the project root.

use crate::ToolError;
use std::path::{Component, Path, PathBuf};

/// Files or directories that mark a PHP project root.
const ROOT_MARKERS: &[&str] = &[".phprefactor", "composer.json"];

/// Resolve a possibly relative path against `root`.
///
/// Absolute paths are kept, relative ones are joined onto `root`. `.` and
/// `..` are folded lexically so the result doesn't depend on the filesystem.
pub fn resolve(root: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Find the project root for `start`.
///
/// Walks up looking for `.phprefactor/` or `composer.json`; falls back to
/// `start` itself when no marker is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, ToolError> {
    if !start.is_dir() {
        return Err(ToolError::NoProjectRoot(start.to_path_buf()));
    }
    let start = std::path::absolute(start)?;

    let found = start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|marker| dir.join(marker).exists()));

    Ok(normalize(found.unwrap_or(&start)))
}
