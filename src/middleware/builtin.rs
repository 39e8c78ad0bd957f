//! Ready-made middleware.

use std::sync::Arc;
use std::time::Instant;
use log::{error, info};

use crate::middleware::Middleware;
use crate::parser::HttpRequest;
use crate::server::{Error, Handler, HandlerFuture, HttpResponse, StatusCode};

/// Header written by [`ResponseTime`].
pub const RESPONSE_TIME_HEADER: &str = "X-Response-Time";

/// Measures how long the inner chain takes and reports it in the
/// `X-Response-Time` header, e.g. `X-Response-Time: 12ms`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTime;

impl Middleware for ResponseTime {
    fn wrap(&self, next: Handler) -> Handler {
        Arc::new(move |req: HttpRequest| -> HandlerFuture { Box::pin(time_response(next.clone(), req)) })
    }
}

async fn time_response(next: Handler, req: HttpRequest) -> Result<HttpResponse, Error> {
    let start = Instant::now();
    let response = next(req).await?;
    let elapsed = start.elapsed().as_millis();
    Ok(response.with_header(RESPONSE_TIME_HEADER, format!("{elapsed}ms")))
}

/// Logs one line per request at `info` level once the inner chain has
/// produced a response: `GET /path - 200 (3ms)`.
///
/// The timing part is taken from `X-Response-Time`, so place this outside of
/// [`ResponseTime`] to see it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn wrap(&self, next: Handler) -> Handler {
        Arc::new(move |req: HttpRequest| -> HandlerFuture { Box::pin(log_request(next.clone(), req)) })
    }
}

async fn log_request(next: Handler, req: HttpRequest) -> Result<HttpResponse, Error> {
    let method = req.method;
    let target = req.target.clone();

    match next(req).await {
        Ok(response) => {
            let elapsed = response.get_header(RESPONSE_TIME_HEADER).map(String::as_str).unwrap_or("-");
            info!("{method} {target} - {status} ({elapsed})", status = response.status.as_u16());
            Ok(response)
        }
        Err(e) => {
            error!("{method} {target} - failed: {e}");
            Err(e)
        }
    }
}

/// Turns errors from the inner chain into `500 Internal Server Error`
/// responses carrying the error message.
///
/// Without it, errors propagate to the transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorResponder;

impl Middleware for ErrorResponder {
    fn wrap(&self, next: Handler) -> Handler {
        Arc::new(move |req: HttpRequest| -> HandlerFuture { Box::pin(respond_to_errors(next.clone(), req)) })
    }
}

async fn respond_to_errors(next: Handler, req: HttpRequest) -> Result<HttpResponse, Error> {
    match next(req).await {
        Ok(response) => Ok(response),
        Err(e) => Ok(HttpResponse::new(StatusCode::InternalServerError)
            .with_content_type("text/plain")
            .with_body_string(e.to_string())),
    }
}
