use std::sync::Arc;

use async_trait::async_trait;
use rpc_log_sink::{
    time::SystemTimeProvider, Code, EventLogger, LogHelper, LogRecord, Metadata, Sink,
};

/// Example of integrating a completely custom backend by implementing
/// the `Sink` trait directly. Imagine this talks to some proprietary
/// store for which this crate does not provide a built-in sink.
struct MyCustomDbSink;

#[async_trait]
impl Sink for MyCustomDbSink {
    async fn write(&self, record: &LogRecord) {
        // Here you would call your own client library and log, not return,
        // any failure.
        println!("[my-custom-db] {:?}", record);
    }

    async fn close(&self) {}
}

#[tokio::main]
async fn main() {
    let sink: Arc<dyn Sink> = Arc::new(MyCustomDbSink);
    let helper = LogHelper::new(sink, Arc::new(SystemTimeProvider));

    helper
        .log_trailer(
            9,
            "orders.Orders",
            "Create",
            &Code::Unavailable.to_status().with_description("backend down"),
            &Metadata::new(),
            EventLogger::Server,
            "rpc-1",
            None,
        )
        .await
        .expect("valid event");
}
