//! Tests for the application builder, the dispatcher and the HTTP server.

#[cfg(test)]
mod server_tests {
    use std::collections::HashMap;
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use serde_json::json;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
    use tokio::net::TcpStream;

    use crate::middleware::{from_fn, ErrorResponder, Middleware};
    use crate::params::decode_body;
    use crate::parser::{HttpRequest, HttpVersion, Method};
    use crate::server::{
        handler_fn, App, Body, DispatchConfig, Dispatcher, Error, Handler, HttpResponse, HttpServer, Route,
        RouteMeta, ServerConfig, StatusCode,
    };

    // Mock TcpStream for testing
    struct MockTcpStream {
        read_data: Cursor<Vec<u8>>,
        write_data: Vec<u8>,
    }

    impl MockTcpStream {
        fn new(read_data: Vec<u8>) -> Self {
            Self {
                read_data: Cursor::new(read_data),
                write_data: Vec::new(),
            }
        }

        fn written(&self) -> String {
            String::from_utf8_lossy(&self.write_data).into_owned()
        }
    }

    impl AsyncRead for MockTcpStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            let n = std::io::Read::read(&mut this.read_data, buf.initialize_unfilled())?;
            buf.advance(n);
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockTcpStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    // A peer that resets the connection on every read and write
    struct ResetStream;

    impl AsyncRead for ResetStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()))
        }
    }

    impl AsyncWrite for ResetStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn get(target: &str) -> HttpRequest {
        HttpRequest::new(Method::GET, target, HttpVersion::Http11, HashMap::new())
    }

    fn post(target: &str, content_type: &str, body: &[u8]) -> HttpRequest {
        HttpRequest::with_body(Method::POST, target, HttpVersion::Http11, HashMap::new(), body.to_vec())
            .with_header("Content-Type", content_type)
    }

    async fn echo_params(req: HttpRequest) -> Result<HttpResponse, Error> {
        HttpResponse::new(StatusCode::Ok).with_json(&req.params)
    }

    fn label(name: &'static str) -> impl Middleware {
        from_fn(move |req, next: Handler| async move {
            next(req).await.map(|r| HttpResponse::plain(format!("{name}[{}]", r.body)))
        })
    }

    fn dispatcher(routes: Vec<Route>) -> Dispatcher {
        App::new(routes).unwrap().into_dispatcher()
    }

    #[tokio::test]
    async fn test_route_params_merge_with_query() {
        let dispatcher = dispatcher(vec![Route::get("/route-params/:name", echo_params)]);
        let response = dispatcher.dispatch(get("/route-params/Kretes?x=1")).await.unwrap();

        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.body, Body::Json(json!({ "name": "Kretes", "x": "1" })));
    }

    #[tokio::test]
    async fn test_form_body_params() {
        let dispatcher = dispatcher(vec![Route::post("/post-form", echo_params)]);
        let request = post("/post-form", "application/x-www-form-urlencoded", b"name=RetesForm");
        let response = dispatcher.dispatch(request).await.unwrap();

        assert_eq!(response.body, Body::Json(json!({ "name": "RetesForm" })));
    }

    #[tokio::test]
    async fn test_json_body_params() {
        let dispatcher = dispatcher(vec![Route::post("/post-json", |req| async move {
            format!("Received -> {}", req.param("name").unwrap_or_default())
        })]);
        let request = post("/post-json", "application/json", br#"{"name":"Retes via JSON"}"#);
        let response = dispatcher.dispatch(request).await.unwrap();

        assert_eq!(response.body.to_string(), "Received -> Retes via JSON");
    }

    #[tokio::test]
    async fn test_body_beats_route_beats_query() {
        let dispatcher = dispatcher(vec![Route::post("/items/:name/:id", echo_params)]);
        let request = post(
            "/items/from-route/7?name=from-query&id=0&page=3",
            "application/x-www-form-urlencoded",
            b"name=from-body",
        );
        let response = dispatcher.dispatch(request).await.unwrap();

        assert_eq!(
            response.body,
            Body::Json(json!({ "name": "from-body", "id": "7", "page": "3" }))
        );
    }

    #[tokio::test]
    async fn test_malformed_json_body_contributes_nothing() {
        let dispatcher = dispatcher(vec![Route::post("/post-json/:id", echo_params)]);
        let request = post("/post-json/5?q=1", "application/json", b"{\"name\":");
        let response = dispatcher.dispatch(request).await.unwrap();

        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.body, Body::Json(json!({ "id": "5", "q": "1" })));
    }

    #[tokio::test]
    async fn test_strict_handlers_can_surface_decode_errors() {
        let dispatcher = dispatcher(vec![Route::post("/strict", |req| async move {
            decode_body(req.content_type(), &req.body).map(|params| format!("{} params", params.len()))
        })]);
        let result = dispatcher.dispatch(post("/strict", "application/json", b"not json")).await;

        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[tokio::test]
    async fn test_unmatched_request_gets_not_found() {
        let dispatcher = dispatcher(vec![Route::get("/", |_req| async { "Hello, GET!" })]);
        let response = dispatcher.dispatch(get("/route-doesnt-exist-404")).await.unwrap();

        assert_eq!(response.status, StatusCode::NotFound);
        assert_eq!(response.body.to_string(), "Not Found");
        assert_eq!(response.get_header("Content-Type").unwrap(), "text/html");
    }

    #[tokio::test]
    async fn test_method_must_match_exactly() {
        let dispatcher = dispatcher(vec![Route::get("/", |_req| async { "Hello, GET!" })]);

        let head = HttpRequest::new(Method::HEAD, "/", HttpVersion::Http11, HashMap::new());
        let response = dispatcher.dispatch(head).await.unwrap();
        assert_eq!(response.status, StatusCode::NotFound);
    }

    #[tokio::test]
    async fn test_each_method_has_its_own_route() {
        let dispatcher = dispatcher(vec![
            Route::get("/", |_req| async { "Hello, GET!" }),
            Route::post("/", |_req| async { "Hello, POST!" }),
            Route::put("/", |_req| async { "Hello, PUT!" }),
            Route::delete("/", |_req| async { "Hello, DELETE!" }),
        ]);

        for (method, expected) in [
            (Method::GET, "Hello, GET!"),
            (Method::POST, "Hello, POST!"),
            (Method::PUT, "Hello, PUT!"),
            (Method::DELETE, "Hello, DELETE!"),
        ] {
            let request = HttpRequest::new(method, "/", HttpVersion::Http11, HashMap::new());
            let response = dispatcher.dispatch(request).await.unwrap();
            assert_eq!(response.body.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_custom_not_found_handler() {
        let dispatcher = App::empty()
            .with_not_found(handler_fn(|req| async move {
                HttpResponse::new(StatusCode::NotFound).with_body_string(format!("no route for {}", req.path))
            }))
            .into_dispatcher();
        let response = dispatcher.dispatch(get("/missing?x=1")).await.unwrap();

        assert_eq!(response.body.to_string(), "no route for /missing");
    }

    #[tokio::test]
    async fn test_route_middleware_order() {
        let dispatcher = dispatcher(vec![Route::get("/middleware", |_req| async { "X" })
            .with_middleware(from_fn(|req, next: Handler| async move {
                next(req).await.map(|r| HttpResponse::plain(format!("prepend - {}", r.body)))
            }))
            .with_middleware(from_fn(|req, next: Handler| async move {
                next(req).await.map(|r| HttpResponse::plain(format!("{} - append", r.body)))
            }))]);
        let response = dispatcher.dispatch(get("/middleware")).await.unwrap();

        assert_eq!(response.body.to_string(), "prepend - X - append");
    }

    #[tokio::test]
    async fn test_global_middleware_wraps_route_middleware_and_fallback() {
        let dispatcher = App::new([Route::get("/x", |_req| async { "X" }).with_middleware(label("local"))])
            .unwrap()
            .with_middleware(label("outer"))
            .with_middleware(label("inner"))
            .into_dispatcher();

        let matched = dispatcher.dispatch(get("/x")).await.unwrap();
        assert_eq!(matched.body.to_string(), "outer[inner[local[X]]]");

        let unmatched = dispatcher.dispatch(get("/nope")).await.unwrap();
        assert_eq!(unmatched.body.to_string(), "outer[inner[Not Found]]");
    }

    #[tokio::test]
    async fn test_matched_route_bypasses_fallback() {
        let dispatcher = App::new([Route::get("/", |_req| async { "routed" })])
            .unwrap()
            .with_not_found(handler_fn(|_req| async { "fallback" }))
            .into_dispatcher();

        assert_eq!(dispatcher.dispatch(get("/")).await.unwrap().body.to_string(), "routed");
        assert_eq!(dispatcher.dispatch(get("/other")).await.unwrap().body.to_string(), "fallback");
    }

    #[tokio::test]
    async fn test_handler_without_result_fails() {
        let dispatcher = dispatcher(vec![Route::get("/silent", |_req| async {})]);
        let result = dispatcher.dispatch(get("/silent")).await;

        assert!(matches!(result, Err(Error::NoHandlerResult)));
    }

    #[tokio::test]
    async fn test_handler_returning_none_fails() {
        let dispatcher = dispatcher(vec![Route::get("/maybe", |req| async move {
            req.get_query_param("name").map(|name| format!("Hello, {name}"))
        })]);

        let found = dispatcher.dispatch(get("/maybe?name=Ada")).await.unwrap();
        assert_eq!(found.body.to_string(), "Hello, Ada");
        assert!(matches!(dispatcher.dispatch(get("/maybe")).await, Err(Error::NoHandlerResult)));
    }

    #[tokio::test]
    async fn test_handler_returning_handler_fails() {
        let dispatcher = dispatcher(vec![Route::get("/callable", |_req| async {
            handler_fn(|_req| async { "too late" })
        })]);
        let result = dispatcher.dispatch(get("/callable")).await;

        assert!(matches!(result, Err(Error::InvalidHandlerReturn)));
    }

    #[tokio::test]
    async fn test_explicit_empty_response_is_fine() {
        let dispatcher = dispatcher(vec![Route::delete("/items/:id", |_req| async { HttpResponse::no_content() })]);
        let request = HttpRequest::new(Method::DELETE, "/items/1", HttpVersion::Http11, HashMap::new());
        let response = dispatcher.dispatch(request).await.unwrap();

        assert_eq!(response.status, StatusCode::NoContent);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_error_responder_installed_as_middleware() {
        let dispatcher = App::new([Route::get("/silent", |_req| async {})])
            .unwrap()
            .with_middleware(ErrorResponder)
            .into_dispatcher();
        let response = dispatcher.dispatch(get("/silent")).await.unwrap();

        assert_eq!(response.status, StatusCode::InternalServerError);
    }

    #[tokio::test]
    async fn test_default_headers_and_content_types() {
        let dispatcher = dispatcher(vec![
            Route::get("/text", |_req| async { "text" }),
            Route::get("/json", |_req| async { HttpResponse::ok(json!({ "hello": "Kretes" })) }),
            Route::get("/created", |_req| async { HttpResponse::created(json!({ "status": "Created!" })) }),
            Route::get("/html", |_req| async { HttpResponse::html("<h1>Retes</h1>") }),
            Route::get("/gzip", |_req| async { HttpResponse::ok("zipped").with_encoding("gzip") }),
        ]);

        let text = dispatcher.dispatch(get("/text")).await.unwrap();
        assert_eq!(text.get_header("content-type").unwrap(), "text/plain");
        assert_eq!(text.get_header("Access-Control-Allow-Origin").unwrap(), "*");
        assert_eq!(text.get_header("Access-Control-Allow-Methods").unwrap(), "POST, GET, OPTIONS");
        assert_eq!(text.get_header("Access-Control-Allow-Headers").unwrap(), "Content-Type");

        let json = dispatcher.dispatch(get("/json")).await.unwrap();
        assert_eq!(json.get_header("Content-Type").unwrap(), "application/json");

        let created = dispatcher.dispatch(get("/created")).await.unwrap();
        assert_eq!(created.status, StatusCode::Created);
        assert_eq!(created.get_header("Content-Type").unwrap(), "application/json");

        let html = dispatcher.dispatch(get("/html")).await.unwrap();
        assert_eq!(html.get_header("Content-Type").unwrap(), "text/html");

        let gzip = dispatcher.dispatch(get("/gzip")).await.unwrap();
        assert_eq!(gzip.get_header("Content-Encoding").unwrap(), "gzip");
    }

    #[tokio::test]
    async fn test_handler_headers_are_not_overwritten() {
        let dispatcher = dispatcher(vec![Route::get("/own", |_req| async {
            HttpResponse::ok("mine")
                .with_header("access-control-allow-origin", "https://example.com")
                .with_header("Content-Type", "text/csv")
                .with_content_type("text/plain")
        })]);
        let response = dispatcher.dispatch(get("/own")).await.unwrap();

        assert_eq!(response.get_header("Access-Control-Allow-Origin").unwrap(), "https://example.com");
        assert_eq!(response.get_header("Content-Type").unwrap(), "text/csv");
        assert_eq!(
            response.headers.keys().filter(|k| k.eq_ignore_ascii_case("access-control-allow-origin")).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_apps_can_use_different_default_headers() {
        let routes = || vec![Route::get("/", |_req| async { "hi" })];
        let plain = App::new(routes())
            .unwrap()
            .with_config(DispatchConfig::without_default_headers())
            .into_dispatcher();
        let branded = App::new(routes())
            .unwrap()
            .with_config(DispatchConfig::default().with_default_header("X-Powered-By", "retes"))
            .into_dispatcher();

        let a = plain.dispatch(get("/")).await.unwrap();
        assert!(!a.has_header("Access-Control-Allow-Origin"));
        assert!(a.get_header("X-Powered-By").is_none());

        let b = branded.dispatch(get("/")).await.unwrap();
        assert_eq!(b.get_header("X-Powered-By").unwrap(), "retes");
        assert!(b.has_header("Access-Control-Allow-Origin"));
    }

    #[tokio::test]
    async fn test_reregistered_route_uses_latest_handler() {
        let app = App::new([
            Route::get("/items/:id", |_req| async { "first" }),
            Route::get("/items/:id", |_req| async { "second" }),
        ])
        .unwrap();
        assert_eq!(app.route_count(), 1);

        let dispatcher = app.into_dispatcher();
        let response = dispatcher.dispatch(get("/items/1")).await.unwrap();
        assert_eq!(response.body.to_string(), "second");
    }

    #[tokio::test]
    async fn test_first_registered_route_wins() {
        let dispatcher = dispatcher(vec![
            Route::get("/users/:id", |_req| async { "by id" }),
            Route::get("/users/me", |_req| async { "me" }),
        ]);
        let response = dispatcher.dispatch(get("/users/me")).await.unwrap();
        assert_eq!(response.body.to_string(), "by id");
    }

    #[test]
    fn test_invalid_pattern_aborts_app() {
        let result = App::new([
            Route::get("/ok", |_req| async { "ok" }),
            Route::get("/bad/", |_req| async { "bad" }),
        ]);
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn test_catalog_collects_metadata() {
        let app = App::new([
            Route::get("/users/:id", |_req| async { "user" })
                .with_meta(RouteMeta::summary("Fetch a user").with_description("By numeric id")),
            Route::delete("/users/:id", |_req| async { "gone" }),
            Route::get("/", |_req| async { "root" }),
        ])
        .unwrap();

        let catalog = app.catalog();
        let users = &catalog["/users/:id"];
        assert_eq!(users["get"].summary.as_deref(), Some("Fetch a user"));
        assert_eq!(users["get"].description.as_deref(), Some("By numeric id"));
        assert_eq!(users["delete"].summary.as_deref(), Some("/users/:id"));
        assert_eq!(catalog["/"]["get"].summary.as_deref(), Some("/"));

        let dispatcher = app.into_dispatcher();
        assert_eq!(dispatcher.catalog().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_share_route_table() {
        let dispatcher = dispatcher(vec![Route::get("/n/:n", |req| async move {
            req.param("n").unwrap_or_default().to_string()
        })]);

        let mut tasks = tokio::task::JoinSet::new();
        for n in 0..32 {
            let dispatcher = dispatcher.clone();
            tasks.spawn(async move {
                let response = dispatcher.dispatch(get(&format!("/n/{n}"))).await.unwrap();
                assert_eq!(response.body.to_string(), n.to_string());
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }
    }

    #[test]
    fn test_server_config() {
        let config = ServerConfig {
            addr: "127.0.0.1:8080".parse().unwrap(),
            max_connections: 100,
            read_buffer_size: 4096,
            max_request_size: 2048,
        };

        let server = HttpServer::new(config.clone(), App::empty().into_dispatcher());
        assert_eq!(server.config.addr, config.addr);
        assert_eq!(server.config.max_connections, 100);
        assert_eq!(server.dispatcher().catalog().len(), 0);

        let defaults = ServerConfig::default();
        assert_eq!(defaults.addr.port(), 8080);
        assert_eq!(defaults.max_request_size, 1024 * 1024);
    }

    #[test]
    fn test_response_to_bytes() {
        let response = HttpResponse::ok(json!({ "a": 1 }));
        let bytes = String::from_utf8(response.to_bytes()).unwrap();

        assert!(bytes.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(bytes.contains("Content-Length: 7\r\n"));
        assert!(bytes.ends_with("\r\n\r\n{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_valid_request() {
        let mut stream = MockTcpStream::new(b"GET /route-params/Kretes HTTP/1.1\r\nHost: localhost\r\n\r\n".to_vec());
        let dispatcher = dispatcher(vec![Route::get("/route-params/:name", |req| async move {
            HttpResponse::ok(json!({ "hello": req.param("name") }))
        })]);

        let result = HttpServer::handle_connection(&mut stream, &dispatcher, &ServerConfig::default()).await;
        assert!(result.is_ok());

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: application/json\r\n"));
        assert!(response.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(response.ends_with(r#"{"hello":"Kretes"}"#));
    }

    #[tokio::test]
    async fn test_handle_connection_with_body() {
        let request = b"POST /post-form HTTP/1.1\r\n\
            Host: localhost\r\n\
            Content-Type: application/x-www-form-urlencoded\r\n\
            Content-Length: 14\r\n\
            \r\n\
            name=RetesForm";
        let mut stream = MockTcpStream::new(request.to_vec());
        let dispatcher = dispatcher(vec![Route::post("/post-form", |req| async move {
            format!("Received -> {}", req.param("name").unwrap_or_default())
        })]);

        HttpServer::handle_connection(&mut stream, &dispatcher, &ServerConfig::default()).await.unwrap();
        assert!(stream.written().ends_with("Received -> RetesForm"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_not_found() {
        let mut stream = MockTcpStream::new(b"GET /nonexistent HTTP/1.1\r\nHost: localhost\r\n\r\n".to_vec());
        let dispatcher = dispatcher(vec![Route::get("/test", |_req| async { "Test response" })]);

        let result = HttpServer::handle_connection(&mut stream, &dispatcher, &ServerConfig::default()).await;
        assert!(result.is_ok());

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.contains("Content-Type: text/html\r\n"));
        assert!(response.ends_with("Not Found"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_invalid_request() {
        let mut stream = MockTcpStream::new(b"INVALID REQUEST".to_vec());
        let dispatcher = App::empty().into_dispatcher();

        let result = HttpServer::handle_connection(&mut stream, &dispatcher, &ServerConfig::default()).await;
        assert!(matches!(result, Err(Error::ParseError(_))));

        let response = stream.written();
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("Error parsing request:"));
    }

    #[tokio::test]
    async fn test_handle_connection_maps_handler_errors_to_500() {
        let mut stream = MockTcpStream::new(b"GET /silent HTTP/1.1\r\nHost: localhost\r\n\r\n".to_vec());
        let dispatcher = dispatcher(vec![Route::get("/silent", |_req| async {})]);

        let result = HttpServer::handle_connection(&mut stream, &dispatcher, &ServerConfig::default()).await;
        assert!(matches!(result, Err(Error::NoHandlerResult)));
        assert!(stream.written().starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[tokio::test]
    async fn test_handle_connection_rejects_oversized_request() {
        let request = b"POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: 4096\r\n\r\nabc";
        let mut stream = MockTcpStream::new(request.to_vec());
        let dispatcher = App::empty().into_dispatcher();
        let config = ServerConfig {
            max_request_size: 512,
            ..ServerConfig::default()
        };

        let result = HttpServer::handle_connection(&mut stream, &dispatcher, &config).await;
        assert!(matches!(result, Err(Error::PayloadTooLarge(_))));
        assert!(stream.written().starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[tokio::test]
    async fn test_handle_connection_rejects_overflowing_content_length() {
        let request = format!("POST / HTTP/1.1\r\nHost: x\r\nContent-Length: {}\r\n\r\n", usize::MAX);
        let mut stream = MockTcpStream::new(request.into_bytes());
        let dispatcher = App::empty().into_dispatcher();

        let result = HttpServer::handle_connection(&mut stream, &dispatcher, &ServerConfig::default()).await;
        assert!(matches!(result, Err(Error::PayloadTooLarge(_))));
        assert!(stream.written().starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[tokio::test]
    async fn test_handle_connection_enforces_limit_within_one_read() {
        let body = "a".repeat(200);
        let request = format!(
            "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let mut stream = MockTcpStream::new(request.into_bytes());
        let dispatcher = dispatcher(vec![Route::post("/upload", |_req| async { "stored" })]);
        let config = ServerConfig {
            max_request_size: 100,
            ..ServerConfig::default()
        };
        assert!(config.max_request_size < config.read_buffer_size);

        let result = HttpServer::handle_connection(&mut stream, &dispatcher, &config).await;
        assert!(matches!(result, Err(Error::PayloadTooLarge(_))));
        assert!(stream.written().starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    }

    #[tokio::test]
    async fn test_handle_connection_accepts_request_at_the_limit() {
        let request = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let mut stream = MockTcpStream::new(request.to_vec());
        let dispatcher = dispatcher(vec![Route::get("/", |_req| async { "fits" })]);
        let config = ServerConfig {
            max_request_size: request.len(),
            ..ServerConfig::default()
        };

        HttpServer::handle_connection(&mut stream, &dispatcher, &config).await.unwrap();
        assert!(stream.written().ends_with("fits"));
    }

    #[tokio::test]
    async fn test_handle_connection_reports_reset_as_io_error() {
        let dispatcher = App::empty().into_dispatcher();
        let result = HttpServer::handle_connection(&mut ResetStream, &dispatcher, &ServerConfig::default()).await;
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[tokio::test]
    async fn test_reset_connection_does_not_stop_server() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let server = HttpServer::new(
            ServerConfig::with_addr(addr),
            dispatcher(vec![Route::get("/", |_req| async { "still up" })]),
        );
        let running = tokio::spawn(async move { server.start().await });

        let mut first = loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => break stream,
                Err(_) => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        };
        first.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
        first.set_linger(Some(Duration::ZERO)).unwrap();
        drop(first);
        tokio::time::sleep(Duration::from_millis(50)).await;

        for _ in 0..3 {
            let exchange = async {
                let mut stream = TcpStream::connect(addr).await?;
                stream.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await?;
                let mut response = String::new();
                stream.read_to_string(&mut response).await?;
                Ok::<_, io::Error>(response)
            };
            let response = tokio::time::timeout(Duration::from_secs(2), exchange).await.unwrap().unwrap();
            assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
            assert!(response.ends_with("still up"));
        }

        running.abort();
    }

    #[test]
    fn test_renamed_route_drops_stale_metadata() {
        let app = App::new([
            Route::get("/u/:id", |_req| async { "old" }).with_meta(RouteMeta::summary("Old user route")),
            Route::get("/u/:uid", |_req| async { "new" }),
        ])
        .unwrap();

        assert_eq!(app.route_count(), 1);
        assert_eq!(app.metas.len(), 1);
        assert!(app.metas.contains_key(&(Method::GET, "/u/:uid".to_string())));
        assert_eq!(app.catalog()["/u/:uid"]["get"].summary.as_deref(), Some("/u/:uid"));
    }

    #[tokio::test]
    async fn test_handle_connection_with_closed_connection() {
        let mut stream = MockTcpStream::new(Vec::new());
        let dispatcher = App::empty().into_dispatcher();

        let result = HttpServer::handle_connection(&mut stream, &dispatcher, &ServerConfig::default()).await;
        assert!(result.is_ok());
        assert!(stream.written().is_empty());
    }
}
