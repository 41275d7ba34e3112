// Posts API handlers module

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;

use super::error::ApiError;
use super::posts::{self, NewPost};
use super::response::json_response;
use super::types::{DeleteResponse, HealthResponse};
use crate::config::AppState;
use crate::logger;
use crate::store::Post;

type ApiResult = Result<Response<Full<Bytes>>, Infallible>;

/// GET /api/posts
pub async fn handle_list(state: Arc<AppState>) -> ApiResult {
    let resp = match posts::list_posts(state.store.as_ref()).await {
        Ok(list) => json_response(StatusCode::OK, &list),
        Err(e) => e.into_response(),
    };
    logger::log_api_request("GET", "/api/posts", resp.status().as_u16());
    Ok(resp)
}

/// POST /api/posts
pub async fn handle_create<B>(req: Request<B>, state: Arc<AppState>) -> ApiResult
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let resp = match create_from_request(req, &state).await {
        Ok(post) => json_response(StatusCode::CREATED, &post),
        Err(e) => e.into_response(),
    };
    logger::log_api_request("POST", "/api/posts", resp.status().as_u16());
    Ok(resp)
}

async fn create_from_request<B>(req: Request<B>, state: &AppState) -> Result<Post, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = read_json_body(req, state.config.http.max_body_size).await?;
    let input = NewPost::from_json(&body)?;
    posts::create_post(state.store.as_ref(), input).await
}

/// PATCH /api/posts/{id}/like
pub async fn handle_like(state: Arc<AppState>, id_segment: &str) -> ApiResult {
    let result = match posts::parse_id(id_segment) {
        Some(id) => posts::like_post(state.store.as_ref(), id).await,
        None => Err(ApiError::PostNotFound),
    };

    let resp = match result {
        Ok(post) => json_response(StatusCode::OK, &post),
        Err(e) => e.into_response(),
    };
    logger::log_api_request(
        "PATCH",
        &format!("/api/posts/{id_segment}/like"),
        resp.status().as_u16(),
    );
    Ok(resp)
}

/// DELETE /api/posts/{id}
pub async fn handle_delete(state: Arc<AppState>, id_segment: &str) -> ApiResult {
    let result = match posts::parse_id(id_segment) {
        Some(id) => posts::delete_post(state.store.as_ref(), id).await,
        None => Err(ApiError::PostNotFound),
    };

    let resp = match result {
        Ok(removed) => json_response(StatusCode::OK, &DeleteResponse { ok: true, removed }),
        Err(e) => e.into_response(),
    };
    logger::log_api_request(
        "DELETE",
        &format!("/api/posts/{id_segment}"),
        resp.status().as_u16(),
    );
    Ok(resp)
}

/// GET /api/stats/emotions
pub async fn handle_stats(state: Arc<AppState>) -> ApiResult {
    let resp = match posts::emotion_stats(state.store.as_ref()).await {
        Ok(stats) => json_response(StatusCode::OK, &stats),
        Err(e) => e.into_response(),
    };
    logger::log_api_request("GET", "/api/stats/emotions", resp.status().as_u16());
    Ok(resp)
}

/// GET /health
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "ok",
            time: posts::now_millis(),
        },
    )
}

/// Collect at most `limit` bytes and decode them as JSON.
///
/// An empty body decodes as `{}` so the caller reports the missing field.
async fn read_json_body<B>(req: Request<B>, limit: u64) -> Result<Value, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let bytes = Limited::new(req.into_body(), limit)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::PayloadTooLarge
            } else {
                ApiError::BodyRead(e.to_string())
            }
        })?
        .to_bytes();

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    serde_json::from_slice(&bytes).map_err(|_| ApiError::InvalidJson)
}
