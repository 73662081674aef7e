use futures_util::{
    future::{FutureExt, Shared},
    pin_mut,
};
use http::{Request, StatusCode};
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    service::service_fn,
    Response,
};
use hyper_util::{
    rt::{tokio::TokioIo, TokioExecutor},
    server::conn::auto::Builder as ServerBuilder,
};
use std::{future::Future, io, net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot::Sender,
    task::JoinSet,
};

use crate::server::{
    self,
    handler::Handler,
    server::Error::{
        LocalSocketAddrError, PublishSocketAddrError, RouterError, ServerConnectionError,
        SocketBindError,
    },
    RequestMetadata,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot bind to socket addr {0}: {1}")]
    SocketBindError(SocketAddr, io::Error),
    #[error("cannot obtain local address: {0}")]
    LocalSocketAddrError(io::Error),
    #[error("cannot send reserved TCP address to test thread {0}")]
    PublishSocketAddrError(SocketAddr),
    #[error("cannot build server runtime: {0}")]
    RuntimeError(io::Error),
    #[error("cannot spawn server thread: {0}")]
    ThreadSpawnError(io::Error),
    #[error("server thread panicked")]
    ThreadPanicked,
    #[error("HTTP error: {0}")]
    HTTPError(#[from] http::Error),
    #[error("cannot process request: {0}")]
    RouterError(#[from] server::handler::Error),
    #[error("Server configuration error: {0}")]
    ConfigurationError(String),
    #[error("Server error: {0}")]
    ServerConnectionError(Box<dyn std::error::Error + Send + Sync>),
    #[error("server is already running")]
    AlreadyRunning,
    #[error("server is not running")]
    NotRunning,
    #[error("server stopped before publishing its address")]
    Unknown,
}

#[derive(Clone, Debug)]
pub(crate) struct HttpServerConfig {
    pub static_port: Option<u16>,
    pub print_access_log: bool,
    pub shutdown_timeout: Duration,
}

/// Serves HTTP/1.1 on the loopback interface and passes every buffered request to `H`.
pub(crate) struct HttpServer<H>
where
    H: Handler + Send + Sync + 'static,
{
    handler: Box<H>,
    config: HttpServerConfig,
}

impl<H> HttpServer<H>
where
    H: Handler + Send + Sync + 'static,
{
    pub fn new(handler: Box<H>, config: HttpServerConfig) -> Self {
        HttpServer { handler, config }
    }

    /// Binds the listener, publishes the bound address through `socket_addr_sender` and serves
    /// until `shutdown` resolves.
    pub async fn start_with_signals<F>(
        self,
        socket_addr_sender: Option<Sender<SocketAddr>>,
        shutdown: F,
    ) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.config.static_port.unwrap_or(0)));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| SocketBindError(addr, e))?;
        let addr = listener.local_addr().map_err(LocalSocketAddrError)?;

        if let Some(sender) = socket_addr_sender {
            sender.send(addr).map_err(PublishSocketAddrError)?;
        }

        tracing::info!("Listening on {}", addr);
        self.run_accept_loop(listener, shutdown).await
    }

    async fn run_accept_loop<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shutdown = shutdown.shared();
        let shutdown_timeout = self.config.shutdown_timeout;
        let server = Arc::new(self);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((tcp_stream, remote_address)) => {
                            tracing::trace!("new TCP connection from {}", remote_address);
                            let server = server.clone();
                            let shutdown = shutdown.clone();
                            connections.spawn(async move {
                                if let Err(err) = serve_connection(server, tcp_stream, shutdown).await {
                                    tracing::debug!("connection error: {:?}", err);
                                }
                            });
                        },
                        Err(err) => {
                            tracing::error!("TCP error: {:?}", err);
                        },
                    };
                    while connections.try_join_next().is_some() {}
                }
                _ = shutdown.clone() => {
                    break;
                }
            }
        }

        drop(listener);
        tracing::debug!("Shutting down, waiting for {} open connections", connections.len());

        let drained = tokio::time::timeout(shutdown_timeout, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                "{} connections did not close within {:?}, aborting them",
                connections.len(),
                shutdown_timeout
            );
            connections.shutdown().await;
        }

        Ok(())
    }

    async fn service(
        self: Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Error> {
        tracing::trace!("New HTTP request received: {}", req.uri());

        let (method, uri) = (req.method().clone(), req.uri().clone());
        let req = buffer_request(req).await;

        let response = match self.handler.handle(req).await {
            Ok(response) => to_service_response(response),
            Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, RouterError(err)),
        };

        if self.config.print_access_log {
            if let Ok(response) = &response {
                tracing::info!("{} {} -> {}", method, uri, response.status().as_u16());
            }
        }

        response
    }
}

async fn serve_connection<H, F>(
    server: Arc<HttpServer<H>>,
    stream: TcpStream,
    shutdown: Shared<F>,
) -> Result<(), Error>
where
    H: Handler + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let server_builder = ServerBuilder::new(TokioExecutor::new());

    let connection = server_builder.serve_connection(
        TokioIo::new(stream),
        service_fn(move |req| server.clone().service(req)),
    );
    pin_mut!(connection);

    tokio::select! {
        result = connection.as_mut() => return result.map_err(ServerConnectionError),
        _ = shutdown => {}
    }

    // Lets an in-flight request finish, idle keep-alive connections close immediately.
    connection.as_mut().graceful_shutdown();
    connection.await.map_err(ServerConnectionError)
}

/// Collects the request body. A failed read is not fatal: the request continues with an empty
/// body and is flagged through its [`RequestMetadata`].
async fn buffer_request(req: Request<Incoming>) -> Request<Bytes> {
    let (parts, body) = req.into_parts();

    let (body, body_read_failed) = match body.collect().await {
        Ok(collected) => (collected.to_bytes(), false),
        Err(err) => {
            tracing::warn!("cannot read request body, continuing with an empty body: {}", err);
            (Bytes::new(), true)
        }
    };

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut()
        .insert(RequestMetadata { body_read_failed });
    req
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn error_response(
    code: StatusCode,
    err: Error,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Error> {
    tracing::error!("failed to process request: {}", err.to_string());
    Ok(Response::builder()
        .status(code)
        .body(full(err.to_string()))?)
}

fn to_service_response(
    response: Response<Bytes>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Error> {
    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, full(body)))
}
