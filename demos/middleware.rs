//! Application-wide and route-local middleware.
//!
//! `GET /` is timed and logged by the application middleware; `GET /middleware`
//! additionally runs two route-local layers and answers
//! `prepend - Hello, Middlewares - append`.

use std::time::Duration;

use log::info;
use retes::middleware::{from_fn, RequestLogger, ResponseTime};
use retes::{App, Handler, HttpResponse, HttpServer, Route, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let prepend = from_fn(|req, next: Handler| async move {
        next(req).await.map(|r| HttpResponse::plain(format!("prepend - {}", r.body)))
    });
    let append = from_fn(|req, next: Handler| async move {
        next(req).await.map(|r| HttpResponse::plain(format!("{} - append", r.body)))
    });

    let app = App::new([
        Route::get("/", |_req| async {
            tokio::time::sleep(Duration::from_millis(101)).await;
            HttpResponse::plain("Hello, World")
        }),
        // equivalent to prepend(append(handler))
        Route::get("/middleware", |_req| async { "Hello, Middlewares" })
            .with_middleware(prepend)
            .with_middleware(append),
    ])?
    // the logger sees the X-Response-Time header set by the layer inside it
    .with_middleware(RequestLogger)
    .with_middleware(ResponseTime);

    info!("Try: curl -i http://127.0.0.1:5544/middleware");

    let config = ServerConfig::with_addr("127.0.0.1:5544".parse()?);
    HttpServer::new(config, app.into_dispatcher()).start().await?;

    Ok(())
}
