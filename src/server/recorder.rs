use crate::common::{data::HitRecord, util::with_timeout};
use std::{
    future::pending,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Keeps the ordered log of all received requests and publishes the path of each request on a
/// bounded queue that tests can consume in arrival order.
pub(crate) struct HitRecorder {
    records: Mutex<Vec<Arc<HitRecord>>>,
    sender: mpsc::Sender<String>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<String>>,
}

impl HitRecorder {
    /// `queue_capacity` must be larger than zero.
    pub fn new(queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue_capacity);
        Self {
            records: Mutex::new(Vec::new()),
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
        }
    }

    /// Appends `record` to the log and enqueues its path.
    ///
    /// A queue slot is reserved first. If the queue is full, this waits for capacity before the
    /// record is logged. The path is then enqueued while the log is locked, so the queue order
    /// always equals the log order.
    pub async fn record(&self, record: HitRecord) -> Arc<HitRecord> {
        let record = Arc::new(record);

        let permit = match self.sender.try_reserve() {
            Ok(permit) => Some(permit),
            Err(TrySendError::Full(())) => {
                tracing::warn!(
                    "Hit queue is full, waiting for a consumer before recording path '{}'",
                    record.path()
                );
                self.sender.reserve().await.ok()
            }
            // The recorder owns the receiver, so the queue cannot be closed here.
            Err(TrySendError::Closed(())) => None,
        };

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push(record.clone());
        if let Some(permit) = permit {
            permit.send(record.path().to_string());
        }
        drop(records);

        record
    }

    /// Returns a snapshot of all records in arrival order.
    pub fn all(&self) -> Vec<Arc<HitRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Waits for the next path to arrive on the queue.
    pub async fn next_path(&self) -> String {
        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(path) => path,
            // The recorder holds a sender, so the queue is never closed and this never resolves.
            None => pending().await,
        }
    }

    /// Like [`HitRecorder::next_path`], but gives up after `timeout`.
    pub async fn next_path_timeout(&self, timeout: Duration) -> Option<String> {
        with_timeout(timeout, self.next_path()).await
    }
}
