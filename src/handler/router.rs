//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method check, mount dispatch,
//! bundle fallback, then the no-cache headers and the access log line.

use crate::config::AppState;
use crate::handler::{assets, static_files};
use crate::http::{self, cache};
use crate::logger::{self, AccessLogEntry};
use crate::mount::MountSource;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{REFERER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
}

/// Main entry point for HTTP request handling
///
/// Request bodies are never read; only the head of the request matters.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();
    let ctx = RequestContext {
        path: parts.uri.path(),
        is_head: parts.method == Method::HEAD,
    };

    let mut response = match parts.method {
        Method::GET | Method::HEAD => route_request(&ctx, &state).await,
        ref method => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()
        }
    };
    cache::apply_no_cache(response.headers_mut());

    if state.access_log {
        log_access(&parts, &response, &state, peer_addr, started);
    }

    Ok(response)
}

/// Route request based on path and mount
async fn route_request(ctx: &RequestContext<'_>, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    let mount = &state.mount;

    match mount.source() {
        MountSource::Catalog { root, extensions } => {
            // 1. Listing endpoint
            if mount.list_path().as_deref() == Some(ctx.path) {
                return assets::serve_listing(ctx, root, mount.prefix(), extensions).await;
            }
            // 2. Anything else under the prefix
            if let Some(tail) = mount.strip_prefix(ctx.path) {
                return assets::serve_catalog_file(ctx, root, tail).await;
            }
        }
        MountSource::SingleAsset { file, .. } => {
            // Only the one fixed path; siblings fall through to the bundle
            if mount.asset_path().as_deref() == Some(ctx.path) {
                return assets::serve_single_asset(ctx, file).await;
            }
        }
    }

    // 3. Default: static bundle
    static_files::serve_bundle(ctx, &state.bundle).await
}

fn log_access(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    state: &AppState,
    peer_addr: SocketAddr,
    started: Instant,
) {
    let header = |name: hyper::header::HeaderName| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version).trim_start_matches("HTTP/").to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.access_log_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bundle;
    use crate::mount::Mount;
    use http_body_util::BodyExt;
    use hyper::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES, PRAGMA};
    use hyper::StatusCode;
    use std::fs;
    use std::time::Duration;

    struct Fixture {
        _models: tempfile::TempDir,
        _bundle: tempfile::TempDir,
        state: Arc<AppState>,
    }

    fn state_for(mount: Mount, bundle_root: &std::path::Path) -> Arc<AppState> {
        Arc::new(AppState {
            mount,
            bundle: Bundle {
                root: bundle_root.canonicalize().unwrap(),
                index_files: vec!["index.html".to_string()],
            },
            access_log: false,
            access_log_format: "common".to_string(),
            keep_alive: true,
            request_timeout: Duration::from_secs(30),
        })
    }

    fn bundle_dir() -> tempfile::TempDir {
        let bundle = tempfile::tempdir().unwrap();
        fs::create_dir_all(bundle.path().join("wasm")).unwrap();
        fs::write(bundle.path().join("wasm/index.html"), b"<html></html>").unwrap();
        bundle
    }

    fn catalog_fixture() -> Fixture {
        let models = tempfile::tempdir().unwrap();
        fs::create_dir_all(models.path().join("a")).unwrap();
        fs::write(models.path().join("a/b.inx"), b"0123456789").unwrap();
        fs::write(models.path().join("c.txt"), b"text").unwrap();
        let bundle = bundle_dir();

        let mount = Mount::catalog("/models", models.path(), [".inx", ".inp"]).unwrap();
        let state = state_for(mount, bundle.path());
        Fixture {
            _models: models,
            _bundle: bundle,
            state,
        }
    }

    fn single_fixture() -> Fixture {
        let models = tempfile::tempdir().unwrap();
        fs::write(models.path().join("m.inx"), b"single-model").unwrap();
        let bundle = bundle_dir();

        let mount = Mount::single_asset("/models", &models.path().join("m.inx"), "model.inx")
            .unwrap();
        let state = state_for(mount, bundle.path());
        Fixture {
            _models: models,
            _bundle: bundle,
            state,
        }
    }

    async fn send(state: &Arc<AppState>, method: Method, uri: &str) -> (Response<Full<Bytes>>, Bytes) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap();
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let response = handle_request(req, Arc::clone(state), peer).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (Response::from_parts(parts, Full::new(bytes.clone())), bytes)
    }

    fn assert_no_cache(response: &Response<Full<Bytes>>) {
        assert_eq!(
            response.headers()[CACHE_CONTROL],
            "no-store, no-cache, must-revalidate, max-age=0"
        );
        assert_eq!(response.headers()[PRAGMA], "no-cache");
        assert_eq!(response.headers()[EXPIRES], "0");
    }

    #[tokio::test]
    async fn test_listing() {
        let fx = catalog_fixture();
        let (response, body) = send(&fx.state, Method::GET, "/models/__list").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
        assert_no_cache(&response);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "models": ["/models/a/b.inx"] }));
        assert_eq!(
            response.headers()[CONTENT_LENGTH],
            body.len().to_string().as_str()
        );
    }

    #[tokio::test]
    async fn test_listing_head_matches_get() {
        let fx = catalog_fixture();
        let (get, get_body) = send(&fx.state, Method::GET, "/models/__list").await;
        let (head, head_body) = send(&fx.state, Method::HEAD, "/models/__list").await;
        assert_eq!(get.status(), head.status());
        assert_eq!(get.headers(), head.headers());
        assert!(!get_body.is_empty());
        assert!(head_body.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_catalog_file() {
        let fx = catalog_fixture();
        let (response, body) = send(&fx.state, Method::GET, "/models/a/b.inx").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "10");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(&body[..], b"0123456789");
        assert_no_cache(&response);
    }

    #[tokio::test]
    async fn test_head_matches_get_for_file() {
        let fx = catalog_fixture();
        let (get, get_body) = send(&fx.state, Method::GET, "/models/a/b.inx").await;
        let (head, head_body) = send(&fx.state, Method::HEAD, "/models/a/b.inx").await;
        assert_eq!(get.status(), head.status());
        assert_eq!(get.headers(), head.headers());
        assert_eq!(get_body.len(), 10);
        assert!(head_body.is_empty());
    }

    #[tokio::test]
    async fn test_query_string_ignored() {
        let fx = catalog_fixture();
        let (response, body) = send(&fx.state, Method::GET, "/models/a/b.inx?t=123").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body[..], b"0123456789");
    }

    #[tokio::test]
    async fn test_percent_encoded_path() {
        let fx = catalog_fixture();
        let (response, _) = send(&fx.state, Method::GET, "/models/a%2Fb.inx").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let fx = catalog_fixture();
        for uri in ["/models/../etc/passwd", "/models/a/%2e%2e/%2e%2e/etc/passwd"] {
            let (response, _) = send(&fx.state, Method::GET, uri).await;
            assert!(
                matches!(response.status(), StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN),
                "{uri} returned {}",
                response.status()
            );
            assert_no_cache(&response);
        }

        let (response, _) = send(&fx.state, Method::GET, "/models//etc/passwd").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_bad_request() {
        let fx = catalog_fixture();
        let (response, _) = send(&fx.state, Method::GET, "/models/%ff.inx").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let fx = catalog_fixture();
        let (response, _) = send(&fx.state, Method::GET, "/models/missing.inx").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_no_cache(&response);

        let (response, body) = send(&fx.state, Method::HEAD, "/models/missing.inx").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_serves_any_extension_on_fetch() {
        let fx = catalog_fixture();
        let (response, body) = send(&fx.state, Method::GET, "/models/c.txt").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body[..], b"text");
    }

    #[tokio::test]
    async fn test_removed_root_is_500() {
        let fx = catalog_fixture();
        let root = match fx.state.mount.source() {
            MountSource::Catalog { root, .. } => root.clone(),
            MountSource::SingleAsset { .. } => unreachable!(),
        };
        fs::remove_dir_all(&root).unwrap();

        let (response, _) = send(&fx.state, Method::GET, "/models/__list").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let (response, _) = send(&fx.state, Method::GET, "/models/a/b.inx").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_edits_visible_without_restart() {
        let fx = catalog_fixture();
        let root = match fx.state.mount.source() {
            MountSource::Catalog { root, .. } => root.clone(),
            MountSource::SingleAsset { .. } => unreachable!(),
        };

        fs::write(root.join("a/b.inx"), b"rewritten").unwrap();
        fs::write(root.join("new.inp"), b"n").unwrap();

        let (_, body) = send(&fx.state, Method::GET, "/models/a/b.inx").await;
        assert_eq!(&body[..], b"rewritten");
        let (_, body) = send(&fx.state, Method::GET, "/models/__list").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "models": ["/models/a/b.inx", "/models/new.inp"] })
        );
    }

    #[tokio::test]
    async fn test_single_asset_mode() {
        let fx = single_fixture();
        let (response, body) = send(&fx.state, Method::GET, "/models/model.inx").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body[..], b"single-model");
        assert_eq!(response.headers()[CONTENT_LENGTH], "12");
        assert_no_cache(&response);

        let (response, _) = send(&fx.state, Method::GET, "/models/other.inx").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (response, _) = send(&fx.state, Method::GET, "/models/__list").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_single_asset_deleted_is_404() {
        let fx = single_fixture();
        let file = match fx.state.mount.source() {
            MountSource::SingleAsset { file, .. } => file.clone(),
            MountSource::Catalog { .. } => unreachable!(),
        };
        fs::remove_file(file).unwrap();

        let (response, _) = send(&fx.state, Method::GET, "/models/model.inx").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bundle_fallback() {
        let fx = catalog_fixture();
        let (response, body) = send(&fx.state, Method::GET, "/wasm/index.html").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(&body[..], b"<html></html>");
        assert_no_cache(&response);

        let (response, _) = send(&fx.state, Method::GET, "/models").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let fx = catalog_fixture();
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let (response, _) = send(&fx.state, method, "/models/a/b.inx").await;
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_no_cache(&response);
        }
    }
}
