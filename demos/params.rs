//! Echoes the merged parameters of every request back as JSON.
//!
//! ```text
//! curl 'http://127.0.0.1:3000/query-params?name=Kretes'
//! curl -d 'name=RetesForm' http://127.0.0.1:3000/body-form
//! curl -H 'Content-Type: application/json' -d '{"name":"Retes"}' http://127.0.0.1:3000/body-json
//! curl http://127.0.0.1:3000/segment/1/2
//! ```

use retes::{App, HttpRequest, HttpResponse, HttpServer, Route, ServerConfig, ServerError, StatusCode};

async fn echo(req: HttpRequest) -> Result<HttpResponse, ServerError> {
    HttpResponse::new(StatusCode::Ok).with_json(&req.params)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let app = App::new([
        Route::get("/query-params", echo),
        Route::post("/body-form", echo),
        Route::post("/body-json", echo),
        Route::get("/segment/:a/:b", echo),
    ])?;

    let config = ServerConfig::with_addr("127.0.0.1:3000".parse()?);
    HttpServer::new(config, app.into_dispatcher()).start().await?;

    Ok(())
}
