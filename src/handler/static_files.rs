//! Static file serving module
//!
//! Serves the front-end bundle from the configured asset directory.

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve a front-end asset, resolving directories to their index file
pub async fn serve_directory(
    ctx: &RequestContext<'_>,
    static_dir: &str,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    match load_from_directory(static_dir, ctx.path, index_files).await {
        Some((content, content_type)) => build_static_file_response(
            content,
            content_type,
            ctx.if_none_match.as_deref(),
            ctx.is_head,
        ),
        None => http::build_404_response(),
    }
}

/// Load static file from directory with index file support
///
/// Returns `None` for missing files and for anything resolving outside
/// `static_dir`.
pub async fn load_from_directory(
    static_dir: &str,
    path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    let relative_path = path.trim_start_matches('/');

    let static_dir_canonical = match Path::new(static_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{static_dir}': {e}"
            ));
            return None;
        }
    };

    let mut file_path = static_dir_canonical.join(relative_path);
    if file_path.is_dir() {
        file_path = resolve_index(&file_path, index_files)?;
    }

    // Missing files are routine 404s
    let file_path_canonical = file_path.canonicalize().ok()?;
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path_canonical.display(),
                e
            ));
            return None;
        }
    };

    Some((content, mime::content_type_for(&file_path_canonical)))
}

fn resolve_index(dir: &Path, index_files: &[String]) -> Option<PathBuf> {
    index_files
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Build static file response with `ETag` revalidation
fn build_static_file_response(
    data: Vec<u8>,
    content_type: &str,
    if_none_match: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(&data);

    // Check if client has cached version
    if cache::check_etag_match(if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    http::build_asset_response(Bytes::from(data), content_type, &etag, is_head)
}
