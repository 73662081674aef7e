use crate::{
    common::data::{HitRecord, PathConfig, RoutedResponse},
    server::{handler::Error, recorder::HitRecorder, registry::Registry, router},
};
use async_trait::async_trait;
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

pub(crate) struct MockServerState {
    registry: Registry,
    total_hits: usize,
}

impl MockServerState {
    pub fn new() -> Self {
        MockServerState {
            registry: Registry::default(),
            total_hits: 0,
        }
    }
}

#[async_trait]
pub(crate) trait StateManager {
    /// Records a received request and counts it as a server hit. Runs before routing.
    async fn record(&self, req: HitRecord) -> Arc<HitRecord>;

    /// Routes a recorded request and returns the response to send. Fails if the serving path
    /// has an invalid header or status configured.
    fn serve(&self, req: &HitRecord) -> Result<RoutedResponse, Error>;
}

pub(crate) struct MockServerStateManager {
    state: Mutex<MockServerState>,
    recorder: HitRecorder,
}

impl MockServerStateManager {
    pub fn new(hit_queue_capacity: usize) -> Self {
        Self {
            state: Mutex::new(MockServerState::new()),
            recorder: HitRecorder::new(hit_queue_capacity),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockServerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers `path` unless it is registered already.
    pub(crate) fn register_path(&self, path: &str) {
        self.lock().registry.register(path);
    }

    /// Applies `f` to the configuration of `path`, registering the path first if needed.
    pub(crate) fn configure_path<F>(&self, path: &str, f: F)
    where
        F: FnOnce(&mut PathConfig),
    {
        let mut state = self.lock();
        f(&mut state.registry.register(path).config);
    }

    pub(crate) fn contains_path(&self, path: &str) -> bool {
        self.lock().registry.lookup(path).is_some()
    }

    pub(crate) fn path_count(&self) -> usize {
        self.lock().registry.count()
    }

    pub(crate) fn path_hits(&self, path: &str) -> Option<usize> {
        self.lock().registry.lookup(path).map(|r| r.hits)
    }

    pub(crate) fn total_hits(&self) -> usize {
        self.lock().total_hits
    }

    pub(crate) fn history(&self) -> Vec<Arc<HitRecord>> {
        self.recorder.all()
    }

    pub(crate) async fn next_path_hit(&self) -> String {
        self.recorder.next_path().await
    }

    pub(crate) async fn next_path_hit_timeout(&self, timeout: Duration) -> Option<String> {
        self.recorder.next_path_timeout(timeout).await
    }
}

#[async_trait]
impl StateManager for MockServerStateManager {
    async fn record(&self, req: HitRecord) -> Arc<HitRecord> {
        self.lock().total_hits += 1;
        self.recorder.record(req).await
    }

    fn serve(&self, req: &HitRecord) -> Result<RoutedResponse, Error> {
        let mut state = self.lock();
        router::route(&mut state.registry, req.method(), req.path(), req.body())
    }
}
