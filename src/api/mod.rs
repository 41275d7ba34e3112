// API module entry
// JSON endpoints for posts, likes and emotion statistics

mod error;
mod handlers;
pub mod posts;
mod response;
mod types;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

// Re-export public types
pub use error::ApiError;
pub use handlers::handle_health;
pub use response::*;
pub use types::{DeleteResponse, EmotionStats, HealthResponse};

/// API route handler
///
/// Dispatches `/api/...` requests to handler functions based on path
/// segments and method
pub async fn handle_api<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["api", "posts"] => match method {
            Method::GET => handlers::handle_list(state).await,
            Method::POST => handlers::handle_create(req, state).await,
            _ => Ok(rejected(&method, &path, "GET, POST")),
        },
        ["api", "posts", id] => match method {
            Method::DELETE => handlers::handle_delete(state, id).await,
            _ => Ok(rejected(&method, &path, "DELETE")),
        },
        ["api", "posts", id, "like"] => match method {
            Method::PATCH => handlers::handle_like(state, id).await,
            _ => Ok(rejected(&method, &path, "PATCH")),
        },
        ["api", "stats", "emotions"] => match method {
            Method::GET => handlers::handle_stats(state).await,
            _ => Ok(rejected(&method, &path, "GET")),
        },
        // Unknown route
        _ => {
            logger::log_api_request(method.as_str(), &path, 404);
            Ok(not_found())
        }
    }
}

fn rejected(method: &Method, path: &str, allow: &'static str) -> Response<Full<Bytes>> {
    logger::log_api_request(method.as_str(), path, 405);
    method_not_allowed(allow)
}
