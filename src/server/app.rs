//! Application builder: turns a declarative route list into a [`Dispatcher`].

use std::collections::HashMap;
use std::sync::Arc;
use log::debug;

use crate::middleware::{compose, Middleware};
use crate::parser::Method;
use crate::router::Router;
use crate::server::config::DispatchConfig;
use crate::server::dispatcher::{Dispatcher, RouteCatalog, Routing};
use crate::server::handler::{handler_fn, Handler};
use crate::server::response::HttpResponse;
use crate::server::route::{Route, RouteMeta};
use crate::server::Error;

/// An application under construction.
///
/// # Examples
///
/// ```
/// use retes::{App, HttpResponse, Route};
/// use retes::middleware::ResponseTime;
///
/// # fn main() -> Result<(), retes::ServerError> {
/// let dispatcher = App::new([
///     Route::get("/", |_req| async { HttpResponse::plain("Hello, GET!") }),
///     Route::post("/", |_req| async { HttpResponse::plain("Hello, POST!") }),
/// ])?
/// .with_middleware(ResponseTime)
/// .into_dispatcher();
///
/// assert_eq!(dispatcher.catalog().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct App {
    router: Router<Handler>,
    pub(super) metas: HashMap<(Method, String), RouteMeta>,
    middleware: Vec<Arc<dyn Middleware>>,
    not_found: Handler,
    config: DispatchConfig,
}

impl App {
    /// Build an application from a route list.
    ///
    /// Fails on the first route whose pattern does not compile.
    pub fn new(routes: impl IntoIterator<Item = Route>) -> Result<Self, Error> {
        routes.into_iter().try_fold(Self::empty(), App::route)
    }

    /// An application with no routes: every request gets the not-found response.
    pub fn empty() -> Self {
        Self {
            router: Router::new(),
            metas: HashMap::new(),
            middleware: Vec::new(),
            not_found: handler_fn(|_req| async { HttpResponse::not_found() }),
            config: DispatchConfig::default(),
        }
    }

    /// Register one more route.
    ///
    /// The route's own middleware is composed around its handler here, so the
    /// router stores one ready pipeline per route.
    pub fn route(mut self, route: Route) -> Result<Self, Error> {
        let Route {
            method,
            path,
            handler,
            middleware,
            meta,
        } = route;

        let pipeline = compose(&middleware, handler);
        match self.router.register(method, &path, pipeline)? {
            Some((replaced, _)) => {
                debug!("Route {method} {path} replaced {replaced}");
                self.metas.remove(&(method, replaced.as_str().to_string()));
            }
            None => debug!("Registered route {method} {path}"),
        }
        self.metas.insert((method, path), meta);
        Ok(self)
    }

    /// Append an application-wide middleware.
    ///
    /// Middleware added first is outermost. All of it runs before routing.
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Replace the handler for requests no route matches.
    pub fn with_not_found(mut self, handler: Handler) -> Self {
        self.not_found = handler;
        self
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of effective routes.
    pub fn route_count(&self) -> usize {
        self.router.len()
    }

    /// Metadata of every effective route, by path then lower-case method.
    ///
    /// A missing summary defaults to the route path.
    pub fn catalog(&self) -> RouteCatalog {
        let mut catalog = RouteCatalog::new();
        for (method, pattern) in self.router.routes() {
            let path = pattern.as_str().to_string();
            let mut meta = self.metas.get(&(method, path.clone())).cloned().unwrap_or_default();
            meta.summary.get_or_insert_with(|| path.clone());
            catalog
                .entry(path)
                .or_default()
                .insert(method.as_str().to_lowercase(), meta);
        }
        catalog
    }

    /// Freeze the application.
    pub fn into_dispatcher(self) -> Dispatcher {
        let catalog = self.catalog();
        let App {
            router,
            mut middleware,
            not_found,
            config,
            ..
        } = self;

        middleware.push(Arc::new(Routing::new(router)));
        let pipeline = compose(&middleware, not_found);
        Dispatcher::new(pipeline, config, catalog)
    }
}
