//! Logger module
//!
//! Provides logging utilities for the server:
//! - Startup banner and shutdown lines
//! - Access logging with multiple formats
//! - Error and warning logging
//! - Optional file-based log targets

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{AppState, Config};
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, state: &AppState, workers: Option<usize>) {
    write_info(&format!("serving static bundle: {}", state.bundle.root.display()));
    write_info(&format!("models mapping: {}", state.mount.describe()));
    if let Some(list_path) = state.mount.list_path() {
        write_info(&format!("model list: http://{addr}{list_path}"));
    }
    if let Some(workers) = workers {
        write_info(&format!("worker threads: {workers}"));
    }
    write_info(&format!("open: http://{addr}/"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => eprintln!("{line}"),
    }
}
