// API error taxonomy and its HTTP mapping

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use thiserror::Error;

use super::response::error_response;
use crate::logger;
use crate::store::StoreError;

/// Everything a post operation can fail with.
///
/// The `Display` text is the client-facing `error` string.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("text is required")]
    TextRequired,

    #[error("text is too short")]
    TextTooShort,

    #[error("post not found")]
    PostNotFound,

    #[error("invalid JSON body")]
    InvalidJson,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("failed to read request body")]
    BodyRead(String),

    #[error("storage error")]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::TextRequired | Self::TextTooShort | Self::InvalidJson | Self::BodyRead(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PostNotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{ "error": "<reason>" }` with the mapped status
    pub fn into_response(self) -> Response<Full<Bytes>> {
        match &self {
            Self::Storage(source) => {
                logger::log_error(&format!("Store operation failed: {source}"));
            }
            Self::BodyRead(detail) => logger::log_warning(&format!("Body read failed: {detail}")),
            _ => {}
        }
        error_response(self.status(), &self.to_string())
    }
}
