use crate::record::LogRecord;
use crate::sink::Sink;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Sink that keeps every record in memory.
///
/// Writes after [`Sink::close`] are ignored with a warning, the same
/// contract the remote sinks follow.
#[derive(Default)]
pub struct InMemorySink {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: Vec<LogRecord>,
    closed: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records written so far, oldest first.
    pub async fn records(&self) -> Vec<LogRecord> {
        self.inner.lock().await.records.clone()
    }

    /// Remove and return everything written so far.
    pub async fn take(&self) -> Vec<LogRecord> {
        std::mem::take(&mut self.inner.lock().await.records)
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}

#[async_trait]
impl Sink for InMemorySink {
    async fn write(&self, record: &LogRecord) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            tracing::warn!(rpc_id = %record.rpc_id, "attempt to write after InMemorySink is closed");
            return;
        }
        inner.records.push(record.clone());
    }

    async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            tracing::warn!("attempt to close after InMemorySink is closed");
            return;
        }
        inner.closed = true;
    }
}
