// Request/response shapes of the posts API

use serde::Serialize;
use std::collections::BTreeMap;

use crate::store::{Emotion, Post};

/// Body of `DELETE /api/posts/{id}`
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
    pub removed: Post,
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Milliseconds since the Unix epoch
    pub time: i64,
}

/// Emotion label -> number of posts carrying it. Absent labels have no posts.
pub type EmotionStats = BTreeMap<Emotion, u64>;
