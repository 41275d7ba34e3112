//! emotion_posts
//!
//! A small posting service: short text posts tagged with an emotion, likes,
//! deletion and per-emotion counts, persisted as one JSON document and served
//! over HTTP/1.1 next to a static front end.

pub mod api;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod store;
