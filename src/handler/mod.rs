//! Request handler module
//!
//! Top-level dispatch between the JSON API and the static front end.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
