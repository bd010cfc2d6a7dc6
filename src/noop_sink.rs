use crate::record::LogRecord;
use crate::sink::Sink;
use async_trait::async_trait;

/// A sink that simply drops all records.
///
/// Useful for measuring the overhead of record assembly without any
/// external I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl Sink for NoopSink {
    async fn write(&self, _record: &LogRecord) {}

    async fn close(&self) {}
}
