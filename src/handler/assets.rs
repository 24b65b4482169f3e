//! Model mount handlers: catalog listing, catalog fetch and single-asset fetch

use crate::error::AssetError;
use crate::handler::router::RequestContext;
use crate::handler::static_files::{reject, serve_path, Origin};
use crate::http::{self, response::JSON_CONTENT_TYPE};
use crate::logger;
use crate::mount::{self, catalog, resolve};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Body of the listing endpoint
#[derive(Debug, Serialize)]
struct ModelList {
    models: Vec<String>,
}

/// `GET <prefix>/__list`: enumerate the catalog as JSON
pub async fn serve_listing(
    ctx: &RequestContext<'_>,
    root: &Path,
    prefix: &str,
    extensions: &BTreeSet<String>,
) -> Response<Full<Bytes>> {
    let (root, prefix, extensions) = (root.to_path_buf(), prefix.to_string(), extensions.clone());
    let walked =
        tokio::task::spawn_blocking(move || catalog::list(&root, &prefix, &extensions)).await;

    let models = match walked {
        Ok(Ok(models)) => models,
        Ok(Err(e)) => return reject(ctx, &e, Origin::Mount),
        Err(e) => {
            logger::log_error(&format!("Catalog walk aborted: {e}"));
            return reject(ctx, &AssetError::MisconfiguredMount, Origin::Mount);
        }
    };

    match serde_json::to_vec(&ModelList { models }) {
        Ok(payload) => http::build_ok_response(Bytes::from(payload), JSON_CONTENT_TYPE, ctx.is_head),
        Err(e) => {
            logger::log_error(&format!("Failed to encode model list: {e}"));
            http::build_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to encode model list",
                ctx.is_head,
            )
        }
    }
}

/// `GET <prefix>/<relative>` in catalog mode
pub async fn serve_catalog_file(
    ctx: &RequestContext<'_>,
    root: &Path,
    tail: &str,
) -> Response<Full<Bytes>> {
    let Some(relative) = mount::decode_tail(tail) else {
        return reject(ctx, &AssetError::InvalidPath, Origin::Mount);
    };

    match resolve(root, &relative) {
        Ok(path) => serve_path(ctx, &path, Origin::Mount).await,
        Err(e) => reject(ctx, &e, Origin::Mount),
    }
}

/// `GET <prefix>/<asset-name>` in single-asset mode.
///
/// The file is checked again on every request so that a deleted or replaced
/// asset is noticed without a restart.
pub async fn serve_single_asset(ctx: &RequestContext<'_>, file: &Path) -> Response<Full<Bytes>> {
    match tokio::fs::metadata(file).await {
        Ok(metadata) if metadata.is_file() => serve_path(ctx, file, Origin::Mount).await,
        Ok(_) => reject(ctx, &AssetError::NotFound, Origin::Mount),
        Err(e) => reject(ctx, &resolve::classify_io(e), Origin::Mount),
    }
}
