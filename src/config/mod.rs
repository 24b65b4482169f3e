// Configuration module entry point
// Loads layered configuration and validates it into the immutable mount

mod state;
mod types;

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::mount::Mount;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

pub use state::{AppState, Bundle};
pub use types::Config;

impl Config {
    /// Load configuration: defaults, then the optional config file, then
    /// `MODELSERVE_*` environment variables, then command-line flags.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.port", 8000)?
            .set_default("mount.prefix", "/models")?
            .set_default("mount.asset_name", "model.inx")?
            .set_default("mount.extensions", vec!["inx", "inp"])?
            .set_default("bundle.root", ".")?
            .set_default("bundle.index_files", vec!["index.html", "index.htm"])?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.request_timeout", 30)?
            .add_source(config::File::from(cli.config.clone()).required(false))
            .add_source(environment())
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("server.workers", cli.workers.map(i64::from))?
            .set_override_option("mount.prefix", cli.prefix.clone())?
            .set_override_option("mount.dir", cli.models_dir.as_deref().map(path_value))?
            .set_override_option("mount.file", cli.model_file.as_deref().map(path_value))?
            .set_override_option("mount.asset_name", cli.asset_name.clone())?
            .set_override_option("mount.extensions", cli.extensions.clone())?
            .set_override_option("bundle.root", cli.static_root.as_deref().map(path_value))?
            .build()?;

        let config: Self = settings.try_deserialize()?;
        if config.server.workers == Some(0) {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(config)
    }

    /// Listening address; always loopback
    pub fn get_socket_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.server.port))
    }

    /// Validate the mount settings into a `Mount`
    pub fn mount(&self) -> Result<Mount, ConfigError> {
        let mount = &self.mount;
        match (&mount.dir, &mount.file) {
            (Some(dir), None) => Mount::catalog(&mount.prefix, dir, &mount.extensions),
            (None, Some(file)) => Mount::single_asset(&mount.prefix, file, &mount.asset_name),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingMount),
            (None, None) => Err(ConfigError::MissingMount),
        }
    }

    /// Canonical bundle root; must be a directory
    pub fn bundle_root(&self) -> Result<PathBuf, ConfigError> {
        self.bundle
            .root
            .canonicalize()
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| ConfigError::BundleNotFound(self.bundle.root.clone()))
    }
}

/// `MODELSERVE_SERVER__PORT=9000`; list keys take comma-separated values
fn environment() -> config::Environment {
    config::Environment::with_prefix("MODELSERVE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("mount.extensions")
        .with_list_parse_key("bundle.index_files")
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
