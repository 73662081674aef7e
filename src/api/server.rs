use crate::{
    api::PathHandle,
    common::{data::HitRecord, runtime, util::Join},
    server::{
        handler::PathHandler,
        server::{Error, HttpServer, HttpServerConfig},
        state::MockServerStateManager,
        MockServerBuilder,
    },
};
use futures_util::FutureExt;
use std::{
    net::SocketAddr,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tokio::sync::oneshot;

const BLOCKING_THREADS: usize = 2;

struct RunningServer {
    address: SocketAddr,
    shutdown: oneshot::Sender<()>,
    thread: JoinHandle<Result<(), Error>>,
}

/// A mock server that answers HTTP requests according to registered paths and records every
/// request it receives.
///
/// Requests are routed by exact path:
///
/// * If `/` is the *only* registered path, it answers requests to every path.
/// * Otherwise only an exactly matching path answers. Unknown paths get `404` with body
///   `Not Found`.
///
/// Be aware that registering a second path turns off the catch-all behavior of a lone `/`.
///
/// A matched path answers `403` with an empty body if the request method is not accepted (see
/// [`PathHandle::methods`]). Accepted requests get the configured payload and status, or these
/// defaults:
///
/// | Method | Body               | Status |
/// |--------|--------------------|--------|
/// | GET    | configured payload | 200    |
/// | POST   | request body       | 202    |
/// | PUT    | request body       | 201    |
/// | DELETE | empty              | 204    |
///
/// The server listens on `127.0.0.1` and runs on a background thread with its own runtime, so
/// it can be used from synchronous and asynchronous tests alike. It is stopped when dropped.
///
/// **Example**:
/// ```
/// use pathmock::MockServer;
///
/// let mut server = MockServer::new();
/// server.add_path("/hello").payload("world");
/// server.start().unwrap();
///
/// let (host, port) = server.host_port().unwrap();
/// assert_eq!(host, "127.0.0.1");
/// assert_ne!(port, 0);
///
/// server.stop().unwrap();
/// ```
pub struct MockServer {
    state: Arc<MockServerStateManager>,
    config: HttpServerConfig,
    worker_threads: usize,
    running: Option<RunningServer>,
}

impl MockServer {
    pub(crate) fn from_parts(
        state: Arc<MockServerStateManager>,
        config: HttpServerConfig,
        worker_threads: usize,
    ) -> Self {
        Self {
            state,
            config,
            worker_threads,
            running: None,
        }
    }

    /// Creates a mock server with default settings. The server does not listen until
    /// [`MockServer::start`] is called.
    pub fn new() -> Self {
        MockServerBuilder::new().build_validated()
    }

    /// Returns a builder to configure a mock server.
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    /// Binds a loopback port and starts serving requests on a background thread.
    ///
    /// This returns after the listener is bound. Binding errors are returned as is, the server
    /// does not retry. Starting a server that is already running fails with
    /// [`Error::AlreadyRunning`].
    pub fn start(&mut self) -> Result<(), Error> {
        if self.running.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let (addr_sender, addr_receiver) = oneshot::channel::<SocketAddr>();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel::<()>();

        let handler = PathHandler::new(self.state.clone());
        let server = HttpServer::new(Box::new(handler), self.config.clone());
        let worker_threads = self.worker_threads;

        let thread = thread::Builder::new()
            .name("pathmock-server".to_string())
            .spawn(move || {
                let runtime =
                    runtime::new(worker_threads, BLOCKING_THREADS).map_err(Error::RuntimeError)?;
                let shutdown = shutdown_receiver.map(|_| ());
                runtime.block_on(server.start_with_signals(Some(addr_sender), shutdown))
            })
            .map_err(Error::ThreadSpawnError)?;

        match addr_receiver.join() {
            Ok(address) => {
                tracing::debug!("Mock server started on {}", address);
                self.running = Some(RunningServer {
                    address,
                    shutdown: shutdown_sender,
                    thread,
                });
                Ok(())
            }
            // The server thread ended before publishing its address, so it has an error for us.
            Err(_) => match thread.join() {
                Ok(Err(err)) => Err(err),
                Ok(Ok(())) => Err(Error::Unknown),
                Err(_) => Err(Error::ThreadPanicked),
            },
        }
    }

    /// Stops listening and waits for the server thread to finish. Open connections get the
    /// configured shutdown timeout to complete in-flight requests.
    ///
    /// Stopping a server that is not running does nothing.
    pub fn stop(&mut self) -> Result<(), Error> {
        let running = match self.running.take() {
            Some(running) => running,
            None => return Ok(()),
        };

        tracing::debug!("Stopping mock server on {}", running.address);

        // An error means the server loop is gone already; joining reports why.
        let _ = running.shutdown.send(());

        running.thread.join().map_err(|_| Error::ThreadPanicked)?
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The address the server is listening on.
    pub fn address(&self) -> Result<SocketAddr, Error> {
        self.running
            .as_ref()
            .map(|r| r.address)
            .ok_or(Error::NotRunning)
    }

    /// The host and port the server is listening on. The host is always `127.0.0.1`.
    pub fn host_port(&self) -> Result<(String, u16), Error> {
        let address = self.address()?;
        Ok((address.ip().to_string(), address.port()))
    }

    /// Builds the URL for `path` on this server, e.g. `http://127.0.0.1:34567/hello`.
    pub fn url<S: AsRef<str>>(&self, path: S) -> Result<String, Error> {
        Ok(format!("http://{}{}", self.address()?, path.as_ref()))
    }

    /// Builds the base URL of this server, e.g. `http://127.0.0.1:34567`.
    pub fn base_url(&self) -> Result<String, Error> {
        self.url("")
    }

    /// Registers `path` and returns a handle to configure it. Registering a path that exists
    /// already returns a handle to the existing registration.
    pub fn add_path<S: Into<String>>(&self, path: S) -> PathHandle {
        let path = path.into();
        self.state.register_path(&path);
        PathHandle::new(self.state.clone(), path)
    }

    /// Returns a handle to `path` if it is registered. Matching is exact.
    pub fn path(&self, path: &str) -> Option<PathHandle> {
        if self.state.contains_path(path) {
            return Some(PathHandle::new(self.state.clone(), path.to_string()));
        }
        None
    }

    /// The number of registered paths.
    pub fn path_count(&self) -> usize {
        self.state.path_count()
    }

    /// The number of requests the server received, including requests answered with `404` or
    /// `403`.
    pub fn hits(&self) -> usize {
        self.state.total_hits()
    }

    /// The number of requests `path` has served, or `None` if `path` is not registered.
    pub fn path_hits(&self, path: &str) -> Option<usize> {
        self.state.path_hits(path)
    }

    /// All requests received so far, in arrival order.
    pub fn hit_records(&self) -> Vec<Arc<HitRecord>> {
        self.state.history()
    }

    /// Returns the path of the next request in arrival order, blocking the calling thread until
    /// one arrives. Every received request is delivered exactly once.
    ///
    /// Do not call this from within an async runtime, use
    /// [`MockServer::next_path_hit_async`] there.
    pub fn next_path_hit(&self) -> String {
        self.state.next_path_hit().join()
    }

    /// Like [`MockServer::next_path_hit`], but returns `None` if no request arrives within
    /// `timeout`.
    pub fn next_path_hit_timeout(&self, timeout: Duration) -> Option<String> {
        self.state.next_path_hit_timeout(timeout).join()
    }

    /// Waits for the path of the next request in arrival order.
    pub async fn next_path_hit_async(&self) -> String {
        self.state.next_path_hit().await
    }

    /// Like [`MockServer::next_path_hit_async`], but returns `None` if no request arrives within
    /// `timeout`.
    pub async fn next_path_hit_timeout_async(&self, timeout: Duration) -> Option<String> {
        self.state.next_path_hit_timeout(timeout).await
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::error!("cannot stop mock server: {}", err);
        }
    }
}
