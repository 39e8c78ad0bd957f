//! Server and dispatcher configuration.

use std::net::{Ipv4Addr, SocketAddr};

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// The read buffer size.
    pub read_buffer_size: usize,
    /// Upper bound on head plus body of a single request, in bytes.
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            max_connections: 1024,
            read_buffer_size: 8192,
            max_request_size: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Default configuration bound to `addr`.
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }
}

/// Per-application dispatch settings.
///
/// Each [`App`](crate::App) owns its own copy, so two applications in one
/// process can send different default headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Headers added to every response that does not already set them.
    pub default_headers: Vec<(String, String)>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_headers: vec![
                ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
                ("Access-Control-Allow-Methods".to_string(), "POST, GET, OPTIONS".to_string()),
                ("Access-Control-Allow-Headers".to_string(), "Content-Type".to_string()),
            ],
        }
    }
}

impl DispatchConfig {
    /// A configuration that adds no headers.
    pub fn without_default_headers() -> Self {
        Self {
            default_headers: Vec::new(),
        }
    }

    /// Add or replace a default header.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.default_headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.default_headers.push((name, value.into()));
        self
    }
}
