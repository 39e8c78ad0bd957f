//! Declarative route definitions.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::middleware::Middleware;
use crate::parser::{HttpRequest, Method};
use crate::server::handler::{handler_fn, Handler, IntoResponse};

/// Descriptive route metadata.
///
/// Routing never reads it; it is collected into the application's route
/// catalog for documentation tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Value>,
}

impl RouteMeta {
    pub fn summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One entry of an application's route table.
///
/// Route-local middleware runs inside any application-wide middleware and
/// ahead of the handler, in the order it was added.
///
/// # Examples
///
/// ```
/// use retes::{HttpResponse, Route, RouteMeta};
///
/// let route = Route::get("/route-params/:name", |req| async move {
///     let name = req.param("name").unwrap_or("stranger").to_string();
///     HttpResponse::ok(serde_json::json!({ "hello": name }))
/// })
/// .with_meta(RouteMeta::summary("Greets by name"));
///
/// assert_eq!(route.path, "/route-params/:name");
/// ```
pub struct Route {
    pub method: Method,
    pub path: String,
    pub handler: Handler,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub meta: RouteMeta,
}

impl Route {
    /// A route for an already built [`Handler`].
    pub fn new(method: Method, path: impl Into<String>, handler: Handler) -> Self {
        Self {
            method,
            path: path.into(),
            handler,
            middleware: Vec::new(),
            meta: RouteMeta::default(),
        }
    }

    /// A route whose handler is an async function, see [`handler_fn`].
    pub fn to<F, Fut>(method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResponse,
    {
        Self::new(method, path, handler_fn(handler))
    }

    pub fn get<F, Fut>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResponse,
    {
        Self::to(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResponse,
    {
        Self::to(Method::POST, path, handler)
    }

    pub fn put<F, Fut>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResponse,
    {
        Self::to(Method::PUT, path, handler)
    }

    pub fn patch<F, Fut>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResponse,
    {
        Self::to(Method::PATCH, path, handler)
    }

    pub fn delete<F, Fut>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResponse,
    {
        Self::to(Method::DELETE, path, handler)
    }

    pub fn head<F, Fut>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResponse,
    {
        Self::to(Method::HEAD, path, handler)
    }

    pub fn options<F, Fut>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoResponse,
    {
        Self::to(Method::OPTIONS, path, handler)
    }

    /// Append a route-local middleware (outer to inner).
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("middleware", &self.middleware.len())
            .field("meta", &self.meta)
            .finish()
    }
}
