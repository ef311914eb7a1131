//! Conversions from HTTP client failures into the engine's error types.
//!
//! `ApiError` and `PushError` live in the engine crate, so these are free functions rather than `From` impls.
use storefront_engine::{normalize::PayloadError, traits::PushError, ApiError};

/// The message the server put in an error body, if the body is the usual `{ "message": … }` object.
pub fn server_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let message = value.get("message")?.as_str()?.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// Maps a non-success HTTP response to an [`ApiError`].
pub fn api_error_for_status(status: u16, body: &str) -> ApiError {
    match status {
        401 | 403 => ApiError::Unauthorized,
        _ => ApiError::Rejected { status, message: server_message(body).unwrap_or_default() },
    }
}

pub fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_decode() {
        ApiError::Json(e.to_string())
    } else {
        ApiError::Transport(e.to_string())
    }
}

pub fn json_error(e: serde_json::Error) -> ApiError {
    ApiError::Json(e.to_string())
}

pub fn payload_error(e: PayloadError) -> ApiError {
    ApiError::Json(e.to_string())
}

pub fn push_transport_error(e: reqwest::Error) -> PushError {
    PushError::Transport(e.to_string())
}
