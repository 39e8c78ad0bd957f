//! Error types for routing, dispatch and the HTTP server.

use thiserror::Error;

use crate::params::DecodeError;
use crate::parser::Error as ParserError;
use crate::router::Error as RouteError;

/// Errors surfaced by the application, the dispatcher and the transport.
///
/// The dispatcher never turns these into responses itself: a handler or
/// middleware error propagates to the transport boundary, which answers with
/// a 500, unless an [`ErrorResponder`](crate::middleware::ErrorResponder) is
/// installed.
#[derive(Debug, Error)]
pub enum Error {
    /// A route pattern could not be compiled. Fatal at startup.
    #[error(transparent)]
    InvalidPattern(#[from] RouteError),

    /// A handler produced no response at all.
    #[error("No response returned from the handler; return a value or an explicit empty response")]
    NoHandlerResult,

    /// A handler returned a callable instead of a response.
    #[error("The handler returned a handler instead of a response value")]
    InvalidHandlerReturn,

    /// A request body could not be decoded.
    #[error("Body decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The request exceeded the configured size limit.
    #[error("Request of {0} bytes exceeds the configured limit")]
    PayloadTooLarge(usize),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    InternalError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
