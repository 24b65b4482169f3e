//! Command-line interface

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Serve a web app bundle and mount model files under a fixed prefix
#[derive(Debug, Clone, Parser)]
#[command(name = "modelserve", version, about)]
#[command(group(ArgGroup::new("mount_source").args(["models_dir", "model_file"])))]
pub struct Cli {
    /// Directory mounted as a browsable catalog under the prefix
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Single file mounted as <prefix>/<asset-name>
    #[arg(long, value_name = "FILE")]
    pub model_file: Option<PathBuf>,

    /// Port to listen on (loopback only)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Mount prefix
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Virtual file name used in single-asset mode
    #[arg(long, value_name = "NAME")]
    pub asset_name: Option<String>,

    /// Extensions listed in catalog mode
    #[arg(long, value_name = "EXT", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Root of the static web bundle
    #[arg(long, value_name = "DIR")]
    pub static_root: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE", default_value = "modelserve.toml")]
    pub config: PathBuf,

    /// Tokio worker threads
    #[arg(long)]
    pub workers: Option<u32>,
}
