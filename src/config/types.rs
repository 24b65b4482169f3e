// Configuration types module
// Raw values as read from defaults, file, environment and command line

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub mount: MountConfig,
    pub bundle: BundleConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Server configuration (the bind host is always loopback)
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub workers: Option<usize>,
}

/// Model mount configuration; exactly one of `dir` and `file` must be set
#[derive(Debug, Deserialize, Clone)]
pub struct MountConfig {
    pub prefix: String,
    pub dir: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub asset_name: String,
    pub extensions: Vec<String>,
}

/// Static web bundle served for everything outside the mount
#[derive(Debug, Deserialize, Clone)]
pub struct BundleConfig {
    pub root: PathBuf,
    pub index_files: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (common, combined, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stderr if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "common".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Per-connection timeout in seconds
    pub request_timeout: u64,
}
