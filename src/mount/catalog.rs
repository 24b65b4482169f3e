//! Catalog enumeration
//!
//! Walks the mount root on every listing request; nothing is cached.

use super::virtual_path;
use crate::error::AssetError;
use crate::logger;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Path;
use walkdir::WalkDir;

/// List every regular file under `root` whose lower-cased extension is in
/// `extensions`, as sorted `<prefix>/<relative>` URLs.
///
/// Symlinked directories are followed. Loops, unreadable entries and names
/// that are not UTF-8 are skipped with a warning. A root that is not a
/// readable directory is an error rather than an empty list.
pub fn list(
    root: &Path,
    prefix: &str,
    extensions: &BTreeSet<String>,
) -> Result<Vec<String>, AssetError> {
    if !root.is_dir() {
        return Err(AssetError::MisconfiguredMount);
    }

    let mut models = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                logger::log_error(&format!("Cannot read models root '{}': {e}", root.display()));
                return Err(AssetError::MisconfiguredMount);
            }
            Err(e) => {
                logger::log_warning(&format!("Skipping catalog entry: {e}"));
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_allowed_extension(entry.path(), extensions) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        match virtual_path(prefix, relative) {
            Some(url) => models.push(url),
            None => logger::log_warning(&format!(
                "Skipping catalog entry with a non UTF-8 name: {}",
                entry.path().display()
            )),
        }
    }

    models.sort();
    Ok(models)
}

fn has_allowed_extension(path: &Path, extensions: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase()))
}
