//! Path resolution and containment
//!
//! Turns a client-supplied relative path into an absolute path that is
//! guaranteed to live under the mount root. Syntactic checks run first,
//! then the joined path is canonicalized (symlinks and all), and only the
//! canonical form is compared against the canonical root.

use crate::error::AssetError;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `requested` (already percent-decoded) against `root`.
///
/// On success the returned path is canonical, is a regular file, and has the
/// canonical root as a prefix.
pub fn resolve(root: &Path, requested: &str) -> Result<PathBuf, AssetError> {
    let (path, metadata) = resolve_contained(root, requested)?;
    if !metadata.is_file() {
        return Err(AssetError::NotFound);
    }
    Ok(path)
}

/// Like [`resolve`] but accepts any existing entry, directories included.
pub fn resolve_contained(
    root: &Path,
    requested: &str,
) -> Result<(PathBuf, fs::Metadata), AssetError> {
    let segments = split_segments(requested)?;

    let root = root
        .canonicalize()
        .map_err(|_| AssetError::MisconfiguredMount)?;

    let candidate = segments
        .iter()
        .fold(root.clone(), |path, segment| path.join(segment));

    let canonical = candidate.canonicalize().map_err(classify_io)?;
    if !canonical.starts_with(&root) {
        return Err(AssetError::PathEscapesRoot);
    }

    let metadata = fs::metadata(&canonical).map_err(classify_io)?;
    Ok((canonical, metadata))
}

/// Split a request tail on `/`, dropping empty and `.` segments.
///
/// Rejects absolute paths and any `..` segment. Each remaining segment must
/// also be a single plain component on the host, so a backslash or drive
/// prefix cannot smuggle in a separator the split did not see.
fn split_segments(requested: &str) -> Result<Vec<&str>, AssetError> {
    if requested.starts_with('/') || Path::new(requested).has_root() {
        return Err(AssetError::InvalidPath);
    }

    let mut segments = Vec::new();
    for segment in requested.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(AssetError::InvalidPath),
            s if s.contains('\0') => return Err(AssetError::InvalidPath),
            s => {
                let plain = Path::new(s)
                    .components()
                    .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
                if !plain {
                    return Err(AssetError::InvalidPath);
                }
                segments.push(s);
            }
        }
    }
    Ok(segments)
}

/// Map a filesystem error to a rejection: permission problems are read
/// failures, anything else means the entry is not there.
pub fn classify_io(err: io::Error) -> AssetError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        AssetError::ReadFailure(err)
    } else {
        AssetError::NotFound
    }
}
