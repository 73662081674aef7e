use crate::{
    api::MockServer,
    server::{
        server::{Error, HttpServerConfig},
        state::MockServerStateManager,
    },
};
use std::{sync::Arc, time::Duration};

const DEFAULT_HIT_QUEUE_CAPACITY: usize = 100_000;
const DEFAULT_WORKER_THREADS: usize = 2;
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configures a [`MockServer`] before it is created.
///
/// Every setting has a default, so `MockServerBuilder::new().build()` is equivalent to
/// [`MockServer::new`].
///
/// **Example**:
/// ```
/// use pathmock::MockServerBuilder;
/// use std::time::Duration;
///
/// let mut server = MockServerBuilder::new()
///     .hit_queue_capacity(1_000)
///     .shutdown_timeout(Duration::from_secs(1))
///     .build()
///     .unwrap();
///
/// server.start().unwrap();
/// assert!(server.is_running());
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockServerBuilder {
    port: Option<u16>,
    print_access_log: Option<bool>,
    hit_queue_capacity: Option<usize>,
    worker_threads: Option<usize>,
    shutdown_timeout: Option<Duration>,
}

impl MockServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a fixed port. By default the operating system assigns a free port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn port_option(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Logs one `info` line per request (method, URI and response status).
    pub fn print_access_log(mut self, enabled: bool) -> Self {
        self.print_access_log = Some(enabled);
        self
    }

    pub fn print_access_log_option(mut self, enabled: Option<bool>) -> Self {
        self.print_access_log = enabled;
        self
    }

    /// Sets how many hit paths can be queued for [`MockServer::next_path_hit`] before request
    /// handling waits for a consumer. Must be larger than zero.
    pub fn hit_queue_capacity(mut self, capacity: usize) -> Self {
        self.hit_queue_capacity = Some(capacity);
        self
    }

    pub fn hit_queue_capacity_option(mut self, capacity: Option<usize>) -> Self {
        self.hit_queue_capacity = capacity;
        self
    }

    /// Sets the number of runtime worker threads serving requests. Must be larger than zero.
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    pub fn worker_threads_option(mut self, threads: Option<usize>) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Sets how long [`MockServer::stop`] waits for open connections to finish.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    pub fn shutdown_timeout_option(mut self, timeout: Option<Duration>) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.hit_queue_capacity == Some(0) {
            return Err(Error::ConfigurationError(
                "hit queue capacity must be larger than 0".to_string(),
            ));
        }

        if self.worker_threads == Some(0) {
            return Err(Error::ConfigurationError(
                "worker thread count must be larger than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builds a [`MockServer`] that is not listening yet.
    pub fn build(self) -> Result<MockServer, Error> {
        self.validate()?;
        Ok(self.build_validated())
    }

    pub(crate) fn build_validated(self) -> MockServer {
        let state = Arc::new(MockServerStateManager::new(
            self.hit_queue_capacity.unwrap_or(DEFAULT_HIT_QUEUE_CAPACITY),
        ));

        MockServer::from_parts(
            state,
            HttpServerConfig {
                static_port: self.port,
                print_access_log: self.print_access_log.unwrap_or(false),
                shutdown_timeout: self.shutdown_timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
            },
            self.worker_threads.unwrap_or(DEFAULT_WORKER_THREADS),
        )
    }

    /// Builds a [`MockServer`] and starts it.
    pub fn start(self) -> Result<MockServer, Error> {
        let mut server = self.build()?;
        server.start()?;
        Ok(server)
    }
}
