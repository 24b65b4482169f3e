// Application state module
// Immutable, validated view of the configuration shared by all connections

use std::path::PathBuf;

use super::types::Config;
use crate::error::ConfigError;
use crate::mount::Mount;

/// Trusted static bundle
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Canonical bundle root
    pub root: PathBuf,
    pub index_files: Vec<String>,
}

/// Application state; never mutated after startup
#[derive(Debug)]
pub struct AppState {
    pub mount: Mount,
    pub bundle: Bundle,
    pub access_log: bool,
    pub access_log_format: String,
    pub keep_alive: bool,
    pub request_timeout: std::time::Duration,
}

impl AppState {
    /// Validate `config` into state. Fails if the mount or the bundle root
    /// does not exist.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            mount: config.mount()?,
            bundle: Bundle {
                root: config.bundle_root()?,
                index_files: config.bundle.index_files.clone(),
            },
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
            keep_alive: config.performance.keep_alive,
            request_timeout: std::time::Duration::from_secs(config.performance.request_timeout),
        })
    }
}
