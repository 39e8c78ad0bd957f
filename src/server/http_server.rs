//! TCP transport: accepts connections and feeds requests to a [`Dispatcher`].

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::signal;
use log::{info, warn, error};
use std::net::SocketAddr;

use crate::parser::{declared_content_length, find_head_end, parse_request};
use crate::server::config::ServerConfig;
use crate::server::dispatcher::Dispatcher;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};

/// An HTTP/1.1 server, one request per connection.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    dispatcher: Dispatcher,
}

impl HttpServer {
    /// Create a new HTTP server serving `dispatcher`.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self { config, dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Log the registered endpoints.
    fn display_server_info(&self) {
        info!("Registered endpoints:");
        for (path, methods) in self.dispatcher.catalog() {
            for (method, meta) in methods {
                let summary = meta.summary.as_deref().unwrap_or_default();
                info!("  {method:<7} {path}  {summary}", method = method.to_uppercase());
            }
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Set up a Ctrl+C handler for graceful shutdown.
    fn setup_ctrl_c_handler(shutdown_tx: Arc<mpsc::Sender<()>>, tasks: &mut JoinSet<()>) {
        tasks.spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    let _ = shutdown_tx.send(()).await;
                }
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                }
            }
        });
    }

    /// Hand an accepted connection to its own task, or turn it away with a
    /// 503 when the connection limit is reached.
    async fn handle_new_connection(
        &self,
        mut socket: tokio::net::TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        tasks: &mut JoinSet<()>,
    ) {
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                let response = HttpResponse::new(StatusCode::ServiceUnavailable)
                    .with_header("Content-Type", "text/plain")
                    .with_body_string("Server is at capacity, please try again later");
                let _ = socket.write_all(&response.to_bytes()).await;
                return;
            }
        };

        let dispatcher = self.dispatcher.clone();
        let config = self.config.clone();

        tasks.spawn(async move {
            // released when the task completes
            let _permit = permit;

            // errors end this connection only; the accept loop keeps running
            match Self::handle_connection(&mut socket, &dispatcher, &config).await {
                Ok(()) => {}
                Err(Error::IoError(e)) => warn!("Connection from {addr} failed: {e}"),
                Err(e) => error!("Error handling connection from {addr}: {e}"),
            }
        });
    }

    /// Log an accept error; returns true when the accept loop should stop.
    async fn handle_accept_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        false
    }

    /// Wait (bounded) for in-flight connections to finish.
    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let shutdown_timeout = tokio::time::Duration::from_secs(30);
        let _ = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        }).await;

        info!("Server shutdown complete");
    }

    /// Start the server and listen for incoming connections.
    pub async fn start(&self) -> Result<(), Error> {
        self.display_server_info();

        let listener = self.setup_listener().await?;
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let shutdown_tx = Arc::new(shutdown_tx);

        let mut tasks = JoinSet::new();
        Self::setup_ctrl_c_handler(shutdown_tx.clone(), &mut tasks);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            self.handle_new_connection(
                                socket,
                                addr,
                                semaphore.clone(),
                                &mut tasks,
                            ).await;
                        },
                        Err(e) => {
                            if Self::handle_accept_error(e).await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        Self::perform_shutdown(&mut tasks).await;

        Ok(())
    }

    /// Read one request: the header section plus `Content-Length` body bytes.
    ///
    /// Returns `None` when the peer closed the connection before sending
    /// anything.
    async fn read_request(
        socket: &mut (impl AsyncRead + Unpin),
        config: &ServerConfig,
    ) -> Result<Option<Vec<u8>>, Error> {
        let mut buf = Vec::new();
        let mut chunk = vec![0; config.read_buffer_size.max(1)];
        let mut expected_len = None;

        loop {
            if expected_len.is_none() {
                if let Some((head_end, body_start)) = find_head_end(&buf) {
                    let content_length = declared_content_length(&buf[..head_end])?.unwrap_or(0);
                    let expected = body_start
                        .checked_add(content_length)
                        .ok_or(Error::PayloadTooLarge(content_length))?;
                    if expected > config.max_request_size {
                        return Err(Error::PayloadTooLarge(expected));
                    }
                    expected_len = Some(expected);
                } else if buf.len() > config.max_request_size {
                    return Err(Error::PayloadTooLarge(buf.len()));
                }
            }

            if expected_len.is_some_and(|expected| buf.len() >= expected) {
                break;
            }

            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        if buf.is_empty() {
            Ok(None)
        } else {
            Ok(Some(buf))
        }
    }

    /// Serve a single request on `socket`.
    ///
    /// Parse failures are answered with 400, oversized requests with 413 and
    /// dispatch errors with 500; the error is then returned for logging.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        dispatcher: &Dispatcher,
        config: &ServerConfig,
    ) -> Result<(), Error> {
        let raw = match Self::read_request(socket, config).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(()),
            Err(Error::PayloadTooLarge(size)) => {
                let response = HttpResponse::new(StatusCode::PayloadTooLarge)
                    .with_header("Content-Type", "text/plain")
                    .with_body_string("Request is too large");
                socket.write_all(&response.to_bytes()).await?;
                return Err(Error::PayloadTooLarge(size));
            }
            Err(Error::ParseError(e)) => return Self::reject_unparsable(socket, e).await,
            Err(e) => return Err(e),
        };

        let request = match parse_request(&raw) {
            Ok(req) => req,
            Err(e) => return Self::reject_unparsable(socket, e).await,
        };

        let response = match dispatcher.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                let response = HttpResponse::new(StatusCode::InternalServerError)
                    .with_header("Content-Type", "text/plain")
                    .with_body_string(format!("Internal server error: {e}"));
                socket.write_all(&response.to_bytes()).await?;
                return Err(e);
            }
        };

        socket.write_all(&response.to_bytes()).await?;
        socket.flush().await?;
        Ok(())
    }

    async fn reject_unparsable(
        socket: &mut (impl AsyncWrite + Unpin),
        e: crate::parser::Error,
    ) -> Result<(), Error> {
        let response = HttpResponse::new(StatusCode::BadRequest)
            .with_header("Content-Type", "text/plain")
            .with_body_string(format!("Error parsing request: {e}"));
        socket.write_all(&response.to_bytes()).await?;
        Err(Error::ParseError(e))
    }
}
