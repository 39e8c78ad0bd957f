//! Onion-style middleware composition.

use std::future::Future;
use std::sync::Arc;

use crate::parser::HttpRequest;
use crate::server::{Error, Handler, HandlerFuture, HttpResponse};

/// Wraps a handler in another handler.
///
/// `wrap` receives the next (inner) handler and returns the handler that runs
/// in its place. The returned handler decides whether to call `next`: calling
/// it once is the normal case, never calling it short-circuits the chain (for
/// example to reject a request). Calling it more than once is misuse and the
/// result is unspecified.
///
/// Any `Fn(Handler) -> Handler` closure is a middleware. Types that carry
/// configuration implement the trait directly.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: Handler) -> Handler;
}

impl<F> Middleware for F
where
    F: Fn(Handler) -> Handler + Send + Sync,
{
    fn wrap(&self, next: Handler) -> Handler {
        self(next)
    }
}

/// Compose `middleware` (ordered outer to inner) around `terminal`.
///
/// `compose(&[m1, m2], h)` is `m1.wrap(m2.wrap(h))`: on the way in `m1` runs
/// before `m2`, on the way out `m2` finishes before `m1`. An empty list
/// returns `terminal` unchanged.
pub fn compose(middleware: &[Arc<dyn Middleware>], terminal: Handler) -> Handler {
    middleware
        .iter()
        .rev()
        .fold(terminal, |next, layer| layer.wrap(next))
}

/// A middleware written as an async function of the request and the next
/// handler. Created by [`from_fn`].
pub struct FromFn<F> {
    f: Arc<F>,
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(HttpRequest, Handler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    fn wrap(&self, next: Handler) -> Handler {
        let f = self.f.clone();
        Arc::new(move |req: HttpRequest| -> HandlerFuture { Box::pin(f(req, next.clone())) })
    }
}

/// Build a middleware from an async function.
///
/// # Examples
///
/// ```
/// use retes::middleware::from_fn;
/// use retes::HttpResponse;
///
/// let append = from_fn(|req, next| async move {
///     next(req)
///         .await
///         .map(|response| HttpResponse::plain(format!("{} - append", response.body)))
/// });
/// # let _ = append;
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(HttpRequest, Handler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    FromFn { f: Arc::new(f) }
}
