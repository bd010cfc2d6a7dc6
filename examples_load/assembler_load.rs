use std::sync::Arc;
use std::time::Instant;

use rpc_log_sink::noop_sink::NoopSink;
use rpc_log_sink::time::SystemTimeProvider;
use rpc_log_sink::{EventLogger, EventType, LogHelper, Metadata};

#[tokio::main]
async fn main() {
    let helper = LogHelper::new(Arc::new(NoopSink), Arc::new(SystemTimeProvider));

    let mut headers = Metadata::new();
    headers.insert("a", "aaaaaaaaa");
    headers.insert("b", "bbbbbbbbb");
    let message = vec![0u8; 256];

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        helper
            .log_response_header(i, "service", "method", &headers, EventLogger::Server, "rpc", None)
            .await
            .expect("valid event");
        helper
            .log_rpc_message(i, "service", "method", EventType::ResponseMessage, message.clone(), EventLogger::Server, "rpc")
            .await
            .expect("valid event");
    }

    let elapsed = start.elapsed();
    println!("assembled {} records in {:?} (~{:.0} rec/s)",
        n * 2,
        elapsed,
        (n * 2) as f64 / elapsed.as_secs_f64()
    );
}
