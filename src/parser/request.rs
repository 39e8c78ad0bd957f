//! The normalized request view and the wire parser that produces it.

use std::collections::HashMap;
use std::str::FromStr;
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::params::Params;
use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Represents an HTTP request as seen by middleware and handlers.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target exactly as received, query string included
    pub target: String,
    /// The path component of the target, still percent-encoded
    pub path: String,
    /// Query parameters, percent-decoded
    pub query: Params,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
    /// The raw request body
    pub body: Vec<u8>,
    /// Parameters merged from the route, the query string and the body.
    ///
    /// Empty until the routing step has matched a route.
    pub params: Params,
}

impl HttpRequest {
    /// Create a new HTTP request with an empty body.
    ///
    /// The target is split into path and query here. Absolute-form targets
    /// (`http://host/path?x=1`) are accepted as well as origin-form ones.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `target` - The request target
    /// * `version` - The HTTP version
    /// * `headers` - The HTTP headers
    pub fn new(method: Method, target: impl Into<String>, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        let target = target.into();
        let (path, query) = split_target(&target);
        let query = query
            .map(|query| form_urlencoded::parse(query.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            method,
            target,
            path,
            query,
            version,
            headers,
            body: Vec::new(),
            params: Params::new(),
        }
    }

    /// Create a new HTTP request with a body.
    pub fn with_body(
        method: Method,
        target: impl Into<String>,
        version: HttpVersion,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        let mut request = Self::new(method, target, version, headers);
        request.body = body;
        request
    }

    /// Add or replace a header, builder style.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Get a header value.
    ///
    /// # Arguments
    ///
    /// * `name` - The header name, matched case-insensitively
    ///
    /// # Returns
    ///
    /// The header value, if it exists
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// The media type of the body, without parameters such as `charset`.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("Content-Type")
            .map(|value| value.split(';').next().unwrap_or_default().trim())
    }

    /// Parse the request body as JSON.
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or an error if the body is not valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::MissingHeader("Content-Type: application/json".to_string()));
        }

        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    /// Check if the request has a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|media_type| media_type.eq_ignore_ascii_case("application/json"))
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query.contains_key(name)
    }

    /// Get a merged parameter (route, query or body).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }
}

/// Split a request target into its raw path and raw query.
///
/// Absolute-form targets lose their scheme and authority; the path is kept
/// exactly as sent, like an origin-form path, with no dot-segment removal.
fn split_target(target: &str) -> (String, Option<String>) {
    let target = match target.split_once("://") {
        Some((_, rest)) if !target.starts_with('/') => {
            let start = rest.find(['/', '?', '#']).unwrap_or(rest.len());
            &rest[start..]
        }
        _ => target,
    };

    let target = target.split_once('#').map_or(target, |(head, _)| head);
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target, None),
    };
    let path = if path.is_empty() { "/" } else { path };
    (path.to_string(), query)
}

/// Locate the blank line ending the header section.
///
/// Returns the end of the head and the start of the body.
pub(crate) fn find_head_end(input: &[u8]) -> Option<(usize, usize)> {
    if let Some(pos) = input.windows(4).position(|w| w == b"\r\n\r\n") {
        return Some((pos, pos + 4));
    }
    input.windows(2).position(|w| w == b"\n\n").map(|pos| (pos, pos + 2))
}

/// Read the `Content-Length` declared in a raw header section, if any.
pub(crate) fn declared_content_length(head: &[u8]) -> Result<Option<usize>, Error> {
    let head = String::from_utf8_lossy(head);
    for line in head.lines().skip(1) {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("Content-Length") {
                let value = value.trim();
                return value
                    .parse::<usize>()
                    .map(Some)
                    .map_err(|_| Error::InvalidContentLength(value.to_string()));
            }
        }
    }
    Ok(None)
}

/// Parse an HTTP request from a byte slice.
///
/// The body is whatever follows the header section, truncated to the declared
/// `Content-Length` when one is present.
///
/// # Arguments
///
/// * `input` - A byte slice containing the HTTP request to parse
///
/// # Returns
///
/// The parsed HTTP request, or an error if the request is invalid
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let (head, body) = match find_head_end(input) {
        Some((head_end, body_start)) => (&input[..head_end], &input[body_start..]),
        None => (input, &input[input.len()..]),
    };

    let head_str = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(_) => return Err(Error::MalformedRequestLine("Invalid UTF-8".to_string())),
    };

    let mut lines = head_str.lines();

    let request_line = match lines.next() {
        Some(line) => line,
        None => return Err(Error::EmptyRequest),
    };

    // method, target, version
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let method = Method::from_str(parts[0])?;

    let target = parts[1];
    if !(target.starts_with('/') || target == "*" || target.contains("://")) {
        return Err(Error::InvalidTarget(target.to_string()));
    }

    let version = HttpVersion::from_str(parts[2])?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        let (name, value) = line.split_once(':').ok_or(Error::InvalidHeaderFormat)?;
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    if version.requires_host() && !headers.keys().any(|k| k.eq_ignore_ascii_case("Host")) {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    let body = match declared_content_length(head)? {
        Some(length) => &body[..length.min(body.len())],
        None => body,
    };

    Ok(HttpRequest::with_body(method, target, version, headers, body.to_vec()))
}
