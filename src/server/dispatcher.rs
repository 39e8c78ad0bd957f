//! Per-request dispatch: routing, parameter merging and response finalization.

use std::collections::BTreeMap;
use std::sync::Arc;
use log::{debug, trace};

use crate::middleware::Middleware;
use crate::params::{decode_body, merge, Params};
use crate::parser::HttpRequest;
use crate::router::Router;
use crate::server::config::DispatchConfig;
use crate::server::handler::{Handler, HandlerFuture};
use crate::server::response::{Body, HttpResponse};
use crate::server::route::RouteMeta;
use crate::server::Error;

/// Route metadata by path, then by lower-case method name.
pub type RouteCatalog = BTreeMap<String, BTreeMap<String, RouteMeta>>;

/// The innermost application middleware: matches the request against the
/// route table.
///
/// On a match the merged parameters are stored on the request and the
/// route's own pipeline is called directly; `next` is skipped. Otherwise the
/// request continues to `next`, which ends at the not-found handler.
pub(crate) struct Routing {
    router: Arc<Router<Handler>>,
}

impl Routing {
    pub(crate) fn new(router: Router<Handler>) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

impl Middleware for Routing {
    fn wrap(&self, next: Handler) -> Handler {
        let router = self.router.clone();
        Arc::new(move |mut req: HttpRequest| -> HandlerFuture {
            let matched = router
                .find(req.method, &req.path)
                .map(|found| (found.value.clone(), found.params));

            let Some((handler, route_params)) = matched else {
                trace!("Unmatched {method} {path}, falling through", method = req.method, path = req.path);
                return next(req);
            };

            trace!("Matched {method} {path}", method = req.method, path = req.path);
            let body_params = decode_body(req.content_type(), &req.body).unwrap_or_else(|e| {
                debug!("Ignoring request body for {method} {path}: {e}", method = req.method, path = req.path);
                Params::new()
            });
            req.params = merge(route_params.into_iter().collect(), req.query.clone(), body_params);
            handler(req)
        })
    }
}

/// Apply the content type, content encoding and default headers to a
/// response without touching headers it already sets.
pub(crate) fn finalize(mut response: HttpResponse, config: &DispatchConfig) -> HttpResponse {
    if !response.has_header("Content-Type") {
        let content_type = match (&response.content_type, &response.body) {
            (Some(content_type), _) => content_type.clone(),
            (None, Body::Json(_)) => "application/json".to_string(),
            (None, _) => "text/plain".to_string(),
        };
        response.headers.insert("Content-Type".to_string(), content_type);
    }

    if let Some(encoding) = response.encoding.clone() {
        if !response.has_header("Content-Encoding") {
            response.headers.insert("Content-Encoding".to_string(), encoding);
        }
    }

    for (name, value) in &config.default_headers {
        if !response.has_header(name) {
            response.headers.insert(name.clone(), value.clone());
        }
    }

    response
}

/// A frozen application, ready to serve requests.
///
/// Each call to [`dispatch`](Dispatcher::dispatch) goes through:
///
/// 1. the application middleware, outermost first;
/// 2. the routing step, which either matches a route (parameters merged,
///    route pipeline invoked) or falls through;
/// 3. the not-found handler, for unmatched requests;
/// 4. finalization of the response on the way out.
///
/// Nothing is shared between dispatches except the read-only route table, so
/// a `Dispatcher` can be cloned into any number of concurrent tasks. There is
/// no timeout: a handler that never completes stalls only its own dispatch.
#[derive(Clone)]
pub struct Dispatcher {
    pipeline: Handler,
    config: Arc<DispatchConfig>,
    catalog: Arc<RouteCatalog>,
}

impl Dispatcher {
    pub(crate) fn new(pipeline: Handler, config: DispatchConfig, catalog: RouteCatalog) -> Self {
        Self {
            pipeline,
            config: Arc::new(config),
            catalog: Arc::new(catalog),
        }
    }

    /// Dispatch one request.
    ///
    /// Errors raised by handlers or middleware are returned as they are;
    /// mapping them to a response is left to the caller.
    pub async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        trace!("Received {method} {target}", method = request.method, target = request.target);
        let response = (self.pipeline)(request).await?;
        Ok(finalize(response, &self.config))
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Metadata of every registered route.
    pub fn catalog(&self) -> &RouteCatalog {
        &self.catalog
    }
}
