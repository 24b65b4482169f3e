//! Request handler module
//!
//! Routes each request to the model mount or the static bundle.

pub mod assets;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
