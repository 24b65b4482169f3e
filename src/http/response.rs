//! HTTP response building module
//!
//! Builders for the handful of responses this server sends. Caching headers
//! are not set here; the router stamps them on every response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Build a 200 response carrying `data`.
///
/// `Content-Length` is always the full length of `data`; for HEAD the body
/// itself is dropped.
pub fn build_ok_response(data: Bytes, content_type: &str, is_head: bool) -> Response<Full<Bytes>> {
    build_response(StatusCode::OK, data, content_type, is_head)
}

/// Build an error response with a short plain-text diagnostic
pub fn build_error_response(
    status: StatusCode,
    message: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let reason = status.canonical_reason().unwrap_or("Error");
    let text = format!("{} {reason}: {message}\n", status.as_u16());
    build_response(status, Bytes::from(text), TEXT_CONTENT_TYPE, is_head)
}

/// Build 404 Not Found response
pub fn build_404_response(is_head: bool) -> Response<Full<Bytes>> {
    build_error_response(StatusCode::NOT_FOUND, "file not found", is_head)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    let mut response = build_error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "only GET and HEAD are supported",
        false,
    );
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static("GET, HEAD"));
    response
}

/// Build 301 redirect response
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    let mut response = build_error_response(StatusCode::MOVED_PERMANENTLY, target, false);
    match hyper::header::HeaderValue::from_str(target) {
        Ok(location) => {
            response.headers_mut().insert(LOCATION, location);
            response
        }
        Err(e) => {
            crate::logger::log_error(&format!("Invalid redirect target '{target}': {e}"));
            build_404_response(false)
        }
    }
}

fn build_response(
    status: StatusCode,
    data: Bytes,
    content_type: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
