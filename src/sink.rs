use crate::record::LogRecord;
use async_trait::async_trait;

/// Destination for [`LogRecord`]s produced by the [`LogHelper`].
///
/// Implementations transport records to a concrete backend (Cloud
/// Logging, memory, nowhere). Neither operation reports failure: a sink
/// absorbs backend errors and reports them through `tracing` so the RPC
/// path that produced the record is never affected.
///
/// [`LogHelper`]: crate::helper::LogHelper
#[async_trait]
pub trait Sink: Send + Sync {
    /// Deliver a single completed record.
    ///
    /// Returns once the backend accepted or rejected the record. There is
    /// no queueing and no retry; a record that fails here is lost.
    async fn write(&self, record: &LogRecord);

    /// Release backend resources.
    ///
    /// Idempotent: calls after the first are no-ops that at most emit a
    /// warning.
    async fn close(&self);
}
