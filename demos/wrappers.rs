//! Response helpers for common status codes, with route metadata.

use retes::middleware::RequestLogger;
use retes::{App, HttpResponse, HttpServer, Route, RouteMeta, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let app = App::new([
        Route::get("/created", |_req| async { HttpResponse::created("payload") })
            .with_meta(RouteMeta::summary("Returns 201 Created")),
        Route::get("/ok", |_req| async { HttpResponse::ok("payload") })
            .with_meta(RouteMeta::summary("Returns 200 OK")),
        Route::get("/accepted", |_req| async { HttpResponse::accepted("payload") })
            .with_meta(RouteMeta::summary("Returns 202 Accepted")),
        Route::get("/redirect", |_req| async { HttpResponse::redirect("/ok") }),
        Route::get("/internal-error", |_req| async {
            HttpResponse::internal_server_error("Internal Server Error")
        }),
    ])?
    .with_middleware(RequestLogger);

    let config = ServerConfig::with_addr("127.0.0.1:5544".parse()?);
    HttpServer::new(config, app.into_dispatcher()).start().await?;

    Ok(())
}
