use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rpc_log_sink::attributes::{Attributes, TRANSPORT_ATTR_REMOTE_ADDR};
use rpc_log_sink::cloud::{CloudLoggingError, CloudLoggingSink, LogEntry, LoggingClient};
use rpc_log_sink::memory_sink::InMemorySink;
use rpc_log_sink::time::FixedTimeProvider;
use rpc_log_sink::{
    extract_peer_address, Code, EventLogger, EventType, LogHelper, LogLevel, Metadata,
};

const RPC_ID: &str = "d155e885-9587-4e77-81f7-3aa5a443d47f";

fn metadata() -> Metadata {
    [("a", "aaaaaaaaa"), ("b", "bbbbbbbbb"), ("c", "ccccccccc")]
        .into_iter()
        .collect()
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<LogEntry>>>);

#[async_trait]
impl LoggingClient for Recorder {
    async fn write_entries(&self, entries: Vec<LogEntry>) -> Result<(), CloudLoggingError> {
        self.0.lock().unwrap().extend(entries);
        Ok(())
    }

    async fn close(&self) -> Result<(), CloudLoggingError> {
        Ok(())
    }
}

#[tokio::test]
async fn client_request_header_record() {
    let sink = Arc::new(InMemorySink::new());
    let helper = LogHelper::new(sink.clone(), Arc::new(FixedTimeProvider(1_000)));

    helper
        .log_request_header(
            1,
            "service",
            "method",
            "authority",
            Some(Duration::from_millis(1234)),
            &metadata(),
            EventLogger::Client,
            RPC_ID,
            None,
        )
        .await
        .unwrap();

    let records = sink.records().await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.event_type, EventType::RequestHeader);
    assert_eq!(record.event_logger, EventLogger::Client);
    assert_eq!(record.log_level, LogLevel::Debug);
    assert_eq!(record.payload_size, 30);
    assert_eq!(record.timeout, Some(Duration::from_millis(1234)));
    assert_eq!(record.peer_address, None);
    assert_eq!(record.authority.as_deref(), Some("authority"));
    assert_eq!(record.rpc_id, RPC_ID);
}

#[tokio::test]
async fn server_call_through_cloud_sink() {
    let recorder = Recorder::default();
    let sink = Arc::new(CloudLoggingSink::with_client("proj", Box::new(recorder.clone())));
    let helper = LogHelper::new(sink, Arc::new(FixedTimeProvider(9_876_000_054_321)));

    let ip: Ipv6Addr = "2001:0db8:0:0:0:0:0002:0001".parse().unwrap();
    let attrs = Attributes::builder()
        .set(
            TRANSPORT_ATTR_REMOTE_ADDR,
            SocketAddr::V6(SocketAddrV6::new(ip, 443, 0, 0)).into(),
        )
        .build();
    let peer = extract_peer_address(&attrs);

    helper
        .log_request_header(
            7,
            "pkg.Service",
            "Call",
            "example.com",
            None,
            &metadata(),
            EventLogger::Server,
            RPC_ID,
            peer,
        )
        .await
        .unwrap();
    helper
        .log_rpc_message(
            8,
            "pkg.Service",
            "Call",
            EventType::RequestMessage,
            &b"hello"[..],
            EventLogger::Server,
            RPC_ID,
        )
        .await
        .unwrap();
    helper
        .log_trailer(
            9,
            "pkg.Service",
            "Call",
            &Code::NotFound.to_status().with_description("no such thing"),
            &Metadata::new(),
            EventLogger::Server,
            RPC_ID,
            peer,
        )
        .await
        .unwrap();
    helper.close().await;

    let entries = recorder.0.lock().unwrap().clone();
    assert_eq!(entries.len(), 3);
    for entry in &entries {
        assert_eq!(entry.log_name, "projects/proj/logs/grpc");
        assert_eq!(entry.json_payload["log_level"], "LOG_LEVEL_DEBUG");
        assert_eq!(entry.json_payload["rpc_id"], RPC_ID);
    }

    let header = &entries[0].json_payload;
    assert_eq!(header["event_type"], "GRPC_CALL_REQUEST_HEADER");
    assert_eq!(header["peer_address"]["type"], "TYPE_IPV6");
    assert_eq!(header["peer_address"]["address"], "2001:db8::2:1");
    assert_eq!(header["peer_address"]["ip_port"], 443);
    assert_eq!(header["payload_size"], "30");
    assert!(header.get("timeout").is_none());

    let message = &entries[1].json_payload;
    assert_eq!(message["message"], "aGVsbG8=");
    assert_eq!(message["payload_size"], "5");

    let trailer = &entries[2].json_payload;
    assert_eq!(trailer["status_code"], 5);
    assert_eq!(trailer["status_message"], "no such thing");
    assert_eq!(trailer["payload_size"], "0");
}
