//! HTTP request model and parser.
//!
//! The parser is the transport-facing half of the crate: it turns raw bytes
//! into the normalized [`HttpRequest`] that the dispatcher consumes.

mod request;
mod method;
mod version;
mod error;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::parse_request;
pub(crate) use request::{declared_content_length, find_head_end};
