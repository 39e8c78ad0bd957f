//! Application assembly, dispatch and the HTTP server.
//!
//! A list of [`Route`]s becomes an [`App`], an `App` is frozen into a
//! [`Dispatcher`], and an [`HttpServer`] feeds network requests to the
//! dispatcher.

mod app;
mod config;
mod dispatcher;
mod error;
mod handler;
mod http_server;
mod response;
mod route;
#[cfg(test)]
mod tests;

// Re-export public items
pub use app::App;
pub use config::{DispatchConfig, ServerConfig};
pub use dispatcher::{Dispatcher, RouteCatalog};
pub use error::Error;
pub use handler::{handler_fn, Handler, HandlerFuture, IntoResponse};
pub use http_server::HttpServer;
pub use response::{Body, HttpResponse, StatusCode};
pub use route::{Route, RouteMeta};
