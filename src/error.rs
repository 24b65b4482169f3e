//! Error types
//!
//! `ConfigError` covers everything that must stop the process before the
//! listener binds. `AssetError` is the per-request rejection taxonomy; each
//! variant maps to exactly one HTTP status.

use hyper::StatusCode;
use std::io;
use std::path::PathBuf;

/// Fatal startup errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("either --models-dir or --model-file must be given")]
    MissingMount,

    #[error("--models-dir and --model-file are mutually exclusive")]
    ConflictingMount,

    #[error("models dir not found: {}", .0.display())]
    DirNotFound(PathBuf),

    #[error("model file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("static root not found: {}", .0.display())]
    BundleNotFound(PathBuf),

    #[error("invalid mount prefix '{0}'")]
    InvalidPrefix(String),

    #[error("invalid asset name '{0}'")]
    InvalidAssetName(String),

    #[error("worker thread count must be at least 1")]
    InvalidWorkers,

    #[error("invalid configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Reasons a request for a mounted asset is refused
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("invalid model path")]
    InvalidPath,

    #[error("path escapes models root")]
    PathEscapesRoot,

    #[error("model file not found")]
    NotFound,

    #[error("failed to read model file")]
    ReadFailure(#[source] io::Error),

    #[error("models root is not configured")]
    MisconfiguredMount,
}

impl AssetError {
    /// HTTP status sent to the client for this rejection
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPath => StatusCode::BAD_REQUEST,
            Self::PathEscapesRoot => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ReadFailure(_) | Self::MisconfiguredMount => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
