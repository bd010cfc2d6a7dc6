use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use rpc_log_sink::memory_sink::InMemorySink;
use rpc_log_sink::time::SystemTimeProvider;
use rpc_log_sink::{Code, EventLogger, EventType, LogHelper, Metadata, TransportAddress};

/// Logs one unary call as seen from the client and prints the JSON
/// records that a sink would receive.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let sink = Arc::new(InMemorySink::new());
    let helper = LogHelper::new(sink.clone(), Arc::new(SystemTimeProvider));

    let rpc_id = "d155e885-9587-4e77-81f7-3aa5a443d47f";
    let server = TransportAddress::from(SocketAddr::from((Ipv4Addr::LOCALHOST, 50051)));
    let mut headers = Metadata::new();
    headers.insert("user-agent", "demo/0.1");

    helper
        .log_request_header(
            1,
            "helloworld.Greeter",
            "SayHello",
            "localhost:50051",
            Some(Duration::from_secs(5)),
            &headers,
            EventLogger::Client,
            rpc_id,
            None,
        )
        .await?;
    helper
        .log_rpc_message(2, "helloworld.Greeter", "SayHello", EventType::RequestMessage, &b"\n\x05world"[..], EventLogger::Client, rpc_id)
        .await?;
    helper
        .log_response_header(3, "helloworld.Greeter", "SayHello", &Metadata::new(), EventLogger::Client, rpc_id, Some(&server))
        .await?;
    helper
        .log_trailer(4, "helloworld.Greeter", "SayHello", &Code::Ok.to_status(), &Metadata::new(), EventLogger::Client, rpc_id, Some(&server))
        .await?;
    helper.close().await;

    for record in sink.records().await {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
