//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: preflight, body size guard,
//! then dispatch to the health check, the JSON API or the static front end.

use crate::api;
use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context for the static asset path
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let enable_cors = state.config.http.enable_cors;
    let mut response = dispatch(req, &state).await;
    http::apply_cors(&mut response, enable_cors);
    Ok(response)
}

async fn dispatch<B>(req: Request<B>, state: &Arc<AppState>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // 1. Preflight
    if req.method() == Method::OPTIONS {
        return http::build_options_response(state.config.http.enable_cors);
    }

    // 2. Check body size
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    let path = req.uri().path();

    // 3. Health check
    if path == "/health" {
        return match *req.method() {
            Method::GET | Method::HEAD => api::handle_health(),
            _ => api::method_not_allowed("GET, HEAD"),
        };
    }

    // 4. JSON API
    if path == "/api" || path.starts_with("/api/") {
        return match api::handle_api(req, Arc::clone(state)).await {
            Ok(resp) => resp,
            Err(never) => match never {},
        };
    }

    // 5. Front-end assets
    match *req.method() {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext {
                path,
                is_head: req.method() == Method::HEAD,
                if_none_match: req
                    .headers()
                    .get("if-none-match")
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string),
            };
            static_files::serve_directory(
                &ctx,
                &state.config.http.static_dir,
                &state.config.http.index_files,
            )
            .await
        }
        _ => {
            logger::log_warning(&format!("Method not allowed: {} {path}", req.method()));
            http::build_405_response()
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::MemoryStore;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn state(config: Config) -> Arc<AppState> {
        Arc::new(AppState::new(config, Arc::new(MemoryStore::new())))
    }

    fn get(uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let resp = handle_request(get("/health"), state(Config::in_memory()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert!(body["time"].is_i64());
    }

    #[tokio::test]
    async fn test_health_rejects_other_methods() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/health")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let resp = handle_request(req, state(Config::in_memory())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["Allow"], "GET, HEAD");
    }

    #[tokio::test]
    async fn test_oversized_content_length_rejected() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/posts")
            .header("content-length", "70000")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let resp = handle_request(req, state(Config::in_memory())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_static_and_method_guard() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>hi</p>").unwrap();
        let mut config = Config::in_memory();
        config.http.static_dir = dir.path().to_string_lossy().into_owned();
        let state = state(config);

        let resp = handle_request(get("/"), state.clone()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = handle_request(get("/nope.js"), state.clone()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let post = Request::builder()
            .method(Method::POST)
            .uri("/index.html")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(post, state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_header_applied() {
        let mut config = Config::in_memory();
        config.http.enable_cors = true;

        let resp = handle_request(get("/api/posts"), state(config)).await.unwrap();
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }
}
