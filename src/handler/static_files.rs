//! Static file serving module
//!
//! Reads resolved files into responses and serves the web bundle that
//! everything outside the mount falls through to.

use crate::config::Bundle;
use crate::error::AssetError;
use crate::handler::router::RequestContext;
use crate::http::{self, mime};
use crate::logger;
use crate::mount::{self, resolve};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Which tree a rejected request was aimed at; picks the diagnostic wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Mount,
    Bundle,
}

impl Origin {
    fn message(self, err: &AssetError) -> String {
        match self {
            Self::Mount => err.to_string(),
            Self::Bundle => match err {
                AssetError::InvalidPath => "invalid path",
                AssetError::PathEscapesRoot => "path escapes static root",
                AssetError::NotFound => "file not found",
                AssetError::ReadFailure(_) => "failed to read file",
                AssetError::MisconfiguredMount => "static root is not available",
            }
            .to_string(),
        }
    }
}

/// Read a resolved file and build a 200 response for it.
///
/// The file is read in full on every request; a read that fails after the
/// path was resolved (file replaced, permissions changed) becomes a 500.
pub async fn serve_path(
    ctx: &RequestContext<'_>,
    path: &Path,
    origin: Origin,
) -> Response<Full<Bytes>> {
    match fs::read(path).await {
        Ok(content) => http::build_ok_response(Bytes::from(content), mime::for_path(path), ctx.is_head),
        Err(e) => reject(ctx, &AssetError::ReadFailure(e), origin),
    }
}

/// Turn a rejection into its status response, logging the interesting ones
pub fn reject(ctx: &RequestContext<'_>, err: &AssetError, origin: Origin) -> Response<Full<Bytes>> {
    let message = origin.message(err);
    match err {
        AssetError::InvalidPath | AssetError::PathEscapesRoot => {
            logger::log_warning(&format!("Path traversal attempt blocked: {} ({message})", ctx.path));
        }
        AssetError::ReadFailure(source) => {
            logger::log_error(&format!("{message} for '{}': {source}", ctx.path));
        }
        AssetError::MisconfiguredMount => {
            logger::log_error(&format!("{message} while serving '{}'", ctx.path));
        }
        AssetError::NotFound => {}
    }
    http::build_error_response(err.status(), &message, ctx.is_head)
}

/// Serve a file from the web bundle, with index file support for directories
pub async fn serve_bundle(ctx: &RequestContext<'_>, bundle: &Bundle) -> Response<Full<Bytes>> {
    let Some(relative) = mount::decode_tail(ctx.path.trim_start_matches('/')) else {
        return reject(ctx, &AssetError::InvalidPath, Origin::Bundle);
    };

    match resolve::resolve_contained(&bundle.root, &relative) {
        Ok((path, metadata)) if metadata.is_file() => serve_path(ctx, &path, Origin::Bundle).await,
        Ok((_, metadata)) if metadata.is_dir() => {
            serve_directory_index(ctx, bundle, &relative).await
        }
        Ok(_) | Err(AssetError::NotFound) => http::build_404_response(ctx.is_head),
        Err(e) => reject(ctx, &e, Origin::Bundle),
    }
}

/// A directory was requested: redirect to the slash form, then try the
/// index files. There is no directory listing.
async fn serve_directory_index(
    ctx: &RequestContext<'_>,
    bundle: &Bundle,
    relative: &str,
) -> Response<Full<Bytes>> {
    if !ctx.path.ends_with('/') {
        return http::build_redirect_response(&format!("{}/", ctx.path));
    }

    let dir = relative.trim_end_matches('/');
    for index_file in &bundle.index_files {
        let candidate = if dir.is_empty() {
            index_file.clone()
        } else {
            format!("{dir}/{index_file}")
        };
        if let Ok(path) = resolve::resolve(&bundle.root, &candidate) {
            return serve_path(ctx, &path, Origin::Bundle).await;
        }
    }

    http::build_404_response(ctx.is_head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
    use hyper::StatusCode;
    use std::fs as stdfs;

    fn bundle() -> (tempfile::TempDir, Bundle) {
        let dir = tempfile::tempdir().unwrap();
        stdfs::create_dir_all(dir.path().join("wasm")).unwrap();
        stdfs::write(dir.path().join("wasm/index.html"), b"<h1>app</h1>").unwrap();
        stdfs::write(dir.path().join("wasm/app.wasm"), b"\0asm").unwrap();
        let bundle = Bundle {
            root: dir.path().canonicalize().unwrap(),
            index_files: vec!["index.html".to_string()],
        };
        (dir, bundle)
    }

    fn ctx(path: &str, is_head: bool) -> RequestContext<'_> {
        RequestContext { path, is_head }
    }

    #[tokio::test]
    async fn test_serves_bundle_file() {
        let (_dir, bundle) = bundle();
        let response = serve_bundle(&ctx("/wasm/app.wasm", false), &bundle).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/wasm");
        assert_eq!(response.headers()[CONTENT_LENGTH], "4");
    }

    #[tokio::test]
    async fn test_directory_redirects_then_serves_index() {
        let (_dir, bundle) = bundle();
        let response = serve_bundle(&ctx("/wasm", false), &bundle).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/wasm/");

        let response = serve_bundle(&ctx("/wasm/", false), &bundle).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<h1>app</h1>");
    }

    #[tokio::test]
    async fn test_directory_without_index_is_404() {
        let (_dir, bundle) = bundle();
        let response = serve_bundle(&ctx("/", false), &bundle).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bundle_traversal_rejected() {
        let (_dir, bundle) = bundle();
        let response = serve_bundle(&ctx("/wasm/../../etc/passwd", false), &bundle).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"400 Bad Request: invalid path\n");
    }

    #[tokio::test]
    async fn test_read_failure_is_500() {
        let (dir, _bundle) = bundle();
        let missing = dir.path().join("vanished.inx");
        let response = serve_path(&ctx("/models/vanished.inx", false), &missing, Origin::Mount).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"500 Internal Server Error: failed to read model file\n");
    }
}
