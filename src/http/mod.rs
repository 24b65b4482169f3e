//! HTTP protocol layer module
//!
//! Response builders, MIME detection and cache headers, independent of what
//! is being served.

pub mod cache;
pub mod mime;
pub mod response;

pub use response::{
    build_404_response, build_405_response, build_error_response, build_ok_response,
    build_redirect_response,
};
