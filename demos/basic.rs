//! The smallest useful application: one route, served on port 5544.

use retes::{App, HttpResponse, HttpServer, Route, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let app = App::new([Route::get("/", |_req| async { HttpResponse::plain("Hello, World") })])?;

    let config = ServerConfig::with_addr("127.0.0.1:5544".parse()?);
    HttpServer::new(config, app.into_dispatcher()).start().await?;

    Ok(())
}
