//! Model mount
//!
//! The mount is the immutable description of what lives under the mount
//! prefix: either a whole directory tree (catalog mode) or exactly one file
//! (single-asset mode). It is built once at startup and shared read-only by
//! every request.

pub mod catalog;
pub mod resolve;

use crate::error::ConfigError;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub use resolve::resolve;

/// Name of the listing endpoint under the mount prefix
pub const LIST_ENDPOINT: &str = "__list";

/// Bytes that must be escaped inside one URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// What the mount exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountSource {
    /// A directory tree, filtered by lower-cased extension (no leading dot)
    Catalog {
        root: PathBuf,
        extensions: BTreeSet<String>,
    },
    /// One file served as `<prefix>/<name>`
    SingleAsset { file: PathBuf, name: String },
}

/// Mount prefix plus source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    prefix: String,
    source: MountSource,
}

impl Mount {
    /// Mount a directory. The root is canonicalized and must be a directory.
    pub fn catalog<I, S>(prefix: &str, root: &Path, extensions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefix = normalize_prefix(prefix)?;
        let root = root
            .canonicalize()
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| ConfigError::DirNotFound(root.to_path_buf()))?;
        let extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();

        Ok(Self {
            prefix,
            source: MountSource::Catalog { root, extensions },
        })
    }

    /// Mount a single file. The file is canonicalized and must be a regular file.
    pub fn single_asset(prefix: &str, file: &Path, name: &str) -> Result<Self, ConfigError> {
        let prefix = normalize_prefix(prefix)?;
        let file = file
            .canonicalize()
            .ok()
            .filter(|p| p.is_file())
            .ok_or_else(|| ConfigError::FileNotFound(file.to_path_buf()))?;
        let name = name.trim_matches('/');
        if name.is_empty() || name.contains('/') {
            return Err(ConfigError::InvalidAssetName(name.to_string()));
        }

        Ok(Self {
            prefix,
            source: MountSource::SingleAsset {
                file,
                name: name.to_string(),
            },
        })
    }

    /// Normalized prefix, e.g. `/models`
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub const fn source(&self) -> &MountSource {
        &self.source
    }

    /// Path of the listing endpoint, catalog mode only
    pub fn list_path(&self) -> Option<String> {
        match self.source {
            MountSource::Catalog { .. } => Some(format!("{}/{LIST_ENDPOINT}", self.prefix)),
            MountSource::SingleAsset { .. } => None,
        }
    }

    /// Path of the single mounted asset, single-asset mode only
    pub fn asset_path(&self) -> Option<String> {
        match &self.source {
            MountSource::SingleAsset { name, .. } => Some(format!("{}/{name}", self.prefix)),
            MountSource::Catalog { .. } => None,
        }
    }

    /// The raw tail of `path` after `<prefix>/`, if the path is under the mount
    pub fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())?.strip_prefix('/')
    }

    /// Human-readable mapping for the startup banner
    pub fn describe(&self) -> String {
        match &self.source {
            MountSource::Catalog { root, .. } => {
                format!("{}/* -> {}", self.prefix, root.display())
            }
            MountSource::SingleAsset { file, name } => {
                format!("{}/{name} -> {}", self.prefix, file.display())
            }
        }
    }
}

/// Normalize a mount prefix to a single leading slash and no trailing slash
pub fn normalize_prefix(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_matches('/');
    let valid = !trimmed.is_empty()
        && trimmed
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
    if valid {
        Ok(format!("/{trimmed}"))
    } else {
        Err(ConfigError::InvalidPrefix(raw.to_string()))
    }
}

/// `".INX"` and `"inx"` both become `"inx"`
pub fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_lowercase()
}

/// Percent-decode a request path tail. `None` if the bytes are not UTF-8.
pub fn decode_tail(tail: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(tail).decode_utf8().ok()
}

/// Build the public URL of a file from its path relative to the mount root.
///
/// `None` when a component is not valid UTF-8: such a name has no URL that
/// decodes back to it.
pub fn virtual_path(prefix: &str, relative: &Path) -> Option<String> {
    let encoded = relative
        .components()
        .map(|c| {
            c.as_os_str()
                .to_str()
                .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
        })
        .collect::<Option<Vec<String>>>()?;
    Some(format!("{prefix}/{}", encoded.join("/")))
}
