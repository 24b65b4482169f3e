//! MIME type detection module
//!
//! Fixed extension table so responses do not depend on the host's MIME registry.

use std::path::Path;

/// Fallback for anything not in the table, including model files
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Get MIME Content-Type based on file extension (case-insensitive)
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return OCTET_STREAM;
    };

    match ext.to_ascii_lowercase().as_str() {
        // Models
        "inx" | "inp" => OCTET_STREAM,

        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        _ => OCTET_STREAM,
    }
}

/// Content type for a file on disk
pub fn for_path(path: &Path) -> &'static str {
    get_content_type(path.extension().and_then(|e| e.to_str()))
}
