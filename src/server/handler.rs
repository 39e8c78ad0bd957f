//! Request handlers and the conversion of handler output into responses.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use serde_json::Value;

use crate::parser::HttpRequest;
use crate::server::{Error, HttpResponse};

/// Type alias for a boxed future that returns a Result<HttpResponse, Error>.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// A request handler.
///
/// Route handlers, composed middleware pipelines and the not-found fallback
/// all share this type. Handlers are reference counted so a pipeline can be
/// cloned into every in-flight request.
pub type Handler = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

/// Values a handler may produce.
///
/// A handler that produces nothing (`()` or `None`) is a programming error
/// reported as [`Error::NoHandlerResult`]; use [`HttpResponse::no_content`]
/// for a deliberately empty response. Returning a [`Handler`] instead of a
/// value is reported as [`Error::InvalidHandlerReturn`].
pub trait IntoResponse {
    fn into_response(self) -> Result<HttpResponse, Error>;
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Result<HttpResponse, Error> {
        Ok(self)
    }
}

/// Plain text, like [`HttpResponse::plain`].
impl IntoResponse for String {
    fn into_response(self) -> Result<HttpResponse, Error> {
        Ok(HttpResponse::plain(self))
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Result<HttpResponse, Error> {
        Ok(HttpResponse::plain(self))
    }
}

/// A JSON payload with status 200.
impl IntoResponse for Value {
    fn into_response(self) -> Result<HttpResponse, Error> {
        Ok(HttpResponse::ok(self))
    }
}

impl IntoResponse for () {
    fn into_response(self) -> Result<HttpResponse, Error> {
        Err(Error::NoHandlerResult)
    }
}

impl<T: IntoResponse> IntoResponse for Option<T> {
    fn into_response(self) -> Result<HttpResponse, Error> {
        self.ok_or(Error::NoHandlerResult)?.into_response()
    }
}

impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: Into<Error>,
{
    fn into_response(self) -> Result<HttpResponse, Error> {
        self.map_err(Into::into)?.into_response()
    }
}

impl IntoResponse for Handler {
    fn into_response(self) -> Result<HttpResponse, Error> {
        Err(Error::InvalidHandlerReturn)
    }
}

/// Turn an async function into a [`Handler`].
///
/// # Examples
///
/// ```
/// use retes::{handler_fn, HttpResponse};
///
/// let hello = handler_fn(|_req| async { HttpResponse::plain("Hello, GET!") });
/// let echo = handler_fn(|req| async move { format!("{} {}", req.method, req.path) });
/// # let _ = (hello, echo);
/// ```
pub fn handler_fn<F, Fut>(handler: F) -> Handler
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    Arc::new(move |req: HttpRequest| -> HandlerFuture {
        let fut = handler(req);
        Box::pin(async move { fut.await.into_response() })
    })
}
