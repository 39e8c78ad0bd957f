//! HTTP response types and constructors.

use std::collections::HashMap;
use std::fmt;
use serde::Serialize;
use serde_json::Value;

use crate::server::error::Error;

/// HTTP status codes with their standard reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,
    Found = 302,
    NotModified = 304,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    NotAcceptable = 406,
    Conflict = 409,
    PayloadTooLarge = 413,
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// The numeric status code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Accepted => "Accepted",
            StatusCode::NoContent => "No Content",
            StatusCode::Found => "Found",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::NotAcceptable => "Not Acceptable",
            StatusCode::Conflict => "Conflict",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::BadGateway => "Bad Gateway",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// A response body before serialization.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    /// The explicit "nothing to send" marker.
    #[default]
    Empty,
    Text(String),
    /// Structured payload, serialized as JSON.
    Json(Value),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    fn to_bytes(&self) -> Vec<u8> {
        match self {
            Body::Empty => Vec::new(),
            Body::Text(text) => text.as_bytes().to_vec(),
            Body::Json(value) => value.to_string().into_bytes(),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => Ok(()),
            Body::Text(text) => f.write_str(text),
            Body::Json(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

/// Represents an HTTP response.
///
/// Headers set here take precedence over anything the dispatcher adds while
/// finalizing the response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers set explicitly by the handler or middleware
    pub headers: HashMap<String, String>,
    /// The response body
    pub body: Body,
    /// Declared content type, used when no `Content-Type` header is set
    pub content_type: Option<String>,
    /// Declared content encoding, emitted as `Content-Encoding`
    pub encoding: Option<String>,
}

impl HttpResponse {
    /// Create a new HTTP response with the given status code and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Body::Empty,
            content_type: None,
            encoding: None,
        }
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the response body with a string.
    pub fn with_body_string(self, body: impl Into<String>) -> Self {
        self.with_body(Body::Text(body.into()))
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Declare the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declare the content encoding.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the response body with a JSON value.
    ///
    /// This method serializes the provided value to JSON and sets it as the response body.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let json = serde_json::to_value(value)?;
        Ok(self.with_body(Body::Json(json)))
    }

    /// Get a header value, matching the name case-insensitively.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find_map(|(k, v)| if k.eq_ignore_ascii_case(name) { Some(v) } else { None })
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Convert the response to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self.body.to_bytes();
        let mut bytes = Vec::new();

        let status_line = format!("HTTP/1.1 {} {}\r\n", self.status.as_u16(), self.status.reason_phrase());
        bytes.extend_from_slice(status_line.as_bytes());

        for (name, value) in &self.headers {
            let header_line = format!("{name}: {value}\r\n");
            bytes.extend_from_slice(header_line.as_bytes());
        }
        if !self.has_header("Content-Length") {
            bytes.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
        }

        bytes.extend_from_slice(b"\r\n");
        bytes.extend_from_slice(&body);

        bytes
    }
}

//
// 2xx
//

impl HttpResponse {
    /// 200 with the given body.
    pub fn ok(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::Ok).with_body(body)
    }

    pub fn created(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::Created).with_body(body)
    }

    pub fn accepted(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::Accepted).with_body(body)
    }

    pub fn no_content() -> Self {
        Self::new(StatusCode::NoContent)
    }

    /// 200 `text/plain`.
    pub fn plain(content: impl Into<String>) -> Self {
        Self::ok(Body::Text(content.into())).with_content_type("text/plain")
    }

    /// 200 `text/html`.
    pub fn html(content: impl Into<String>) -> Self {
        Self::ok(Body::Text(content.into())).with_content_type("text/html")
    }
}

//
// 3xx
//

impl HttpResponse {
    /// 302 pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(StatusCode::Found)
            .with_header("Location", location)
            .with_content_type("text/plain")
            .with_body_string("Redirecting...")
    }

    pub fn not_modified() -> Self {
        Self::new(StatusCode::NotModified)
    }
}

//
// 4xx and 5xx
//

impl HttpResponse {
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BadRequest)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::Unauthorized)
    }

    pub fn forbidden(content: impl Into<String>) -> Self {
        Self::new(StatusCode::Forbidden).with_body_string(content)
    }

    /// The default fallback: 404, `text/html`, body `Not Found`.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound)
            .with_content_type("text/html")
            .with_body_string("Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::MethodNotAllowed)
    }

    pub fn not_acceptable() -> Self {
        Self::new(StatusCode::NotAcceptable)
    }

    pub fn conflict(content: impl Into<String>) -> Self {
        Self::new(StatusCode::Conflict).with_body_string(content)
    }

    pub fn internal_server_error(content: impl Into<String>) -> Self {
        Self::new(StatusCode::InternalServerError).with_body_string(content)
    }
}
