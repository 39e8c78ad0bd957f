//! Body decoding errors.

use thiserror::Error;

/// A body could not be decoded for its declared content type.
///
/// The dispatcher treats this as "no body parameters" rather than failing the
/// request.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body declared `application/json` but is not valid JSON.
    #[error("Malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
}
