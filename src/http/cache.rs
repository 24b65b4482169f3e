//! Cache-defeating headers
//!
//! Every response carries these so that an asset rewritten on disk is
//! picked up by the browser on the next reload.

use hyper::header::{HeaderMap, HeaderValue, CACHE_CONTROL, EXPIRES, PRAGMA};

pub const CACHE_CONTROL_VALUE: &str = "no-store, no-cache, must-revalidate, max-age=0";
pub const PRAGMA_VALUE: &str = "no-cache";
pub const EXPIRES_VALUE: &str = "0";

/// Overwrite any caching headers with the no-cache set
pub fn apply_no_cache(headers: &mut HeaderMap) {
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    headers.insert(PRAGMA, HeaderValue::from_static(PRAGMA_VALUE));
    headers.insert(EXPIRES, HeaderValue::from_static(EXPIRES_VALUE));
}
