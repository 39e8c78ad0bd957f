//! Declarative request routing and middleware dispatch.
//!
//! An application is a table of routes, each a method, a path pattern and an
//! async handler, optionally wrapped in route-local middleware. For every
//! request the dispatcher finds the first registered route that matches,
//! merges path, query and body parameters, and runs the handler inside the
//! application's middleware chain.
//!
//! # Features
//!
//! - Path patterns with literal and `:named` segments, matched per method
//! - Parameter merging with a fixed precedence: query < route < body
//! - URL-encoded form and JSON body decoding
//! - Onion-model middleware, application-wide and per route
//! - Configurable not-found handler and default (CORS) response headers
//! - A small async HTTP/1.1 server built on tokio
//!
//! # Examples
//!
//! ## Routes and parameters
//!
//! ```
//! use retes::{App, HttpRequest, HttpResponse, HttpVersion, Method, Route};
//! use std::collections::HashMap;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), retes::ServerError> {
//! let dispatcher = App::new([
//!     Route::get("/route-params/:name", |req| async move {
//!         let name = req.param("name").unwrap_or_default().to_string();
//!         HttpResponse::ok(serde_json::json!({ "hello": name }))
//!     }),
//! ])?
//! .into_dispatcher();
//!
//! let request = HttpRequest::new(Method::GET, "/route-params/Kretes?x=1", HttpVersion::Http11, HashMap::new());
//! let response = dispatcher.dispatch(request).await?;
//!
//! assert_eq!(response.body.to_string(), r#"{"hello":"Kretes"}"#);
//! # Ok(())
//! # }
//! ```
//!
//! ## Middleware
//!
//! Middleware listed first wraps everything after it:
//!
//! ```
//! use retes::{App, HttpRequest, HttpResponse, HttpVersion, Method, Route};
//! use retes::middleware::from_fn;
//! use std::collections::HashMap;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), retes::ServerError> {
//! let prepend = from_fn(|req, next| async move {
//!     next(req).await.map(|r| HttpResponse::plain(format!("prepend - {}", r.body)))
//! });
//! let append = from_fn(|req, next| async move {
//!     next(req).await.map(|r| HttpResponse::plain(format!("{} - append", r.body)))
//! });
//!
//! let dispatcher = App::new([
//!     Route::get("/middleware", |_req| async { "X" })
//!         .with_middleware(prepend)
//!         .with_middleware(append),
//! ])?
//! .into_dispatcher();
//!
//! let request = HttpRequest::new(Method::GET, "/middleware", HttpVersion::Http11, HashMap::new());
//! let response = dispatcher.dispatch(request).await?;
//! assert_eq!(response.body.to_string(), "prepend - X - append");
//! # Ok(())
//! # }
//! ```
//!
//! ## Serving
//!
//! ```no_run
//! use retes::{App, HttpServer, Route, ServerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), retes::ServerError> {
//! let app = App::new([Route::get("/", |_req| async { "Hello, World" })])?;
//! HttpServer::new(ServerConfig::default(), app.into_dispatcher()).start().await
//! # }
//! ```
//!
//! See the `demos` directory for runnable programs.

pub mod middleware;
pub mod params;
pub mod parser;
pub mod router;
pub mod server;

// Re-export commonly used items for convenience
pub use params::Params;
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use server::{
    handler_fn, App, Body, DispatchConfig, Dispatcher, Error as ServerError, Handler, HttpResponse, HttpServer,
    IntoResponse, Route, RouteMeta, ServerConfig, StatusCode,
};
