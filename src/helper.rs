use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use crate::address::{address_to_structured, TransportAddress};
use crate::attributes::{Attributes, TRANSPORT_ATTR_REMOTE_ADDR};
use crate::metadata::Metadata;
use crate::payload::{metadata_to_structured_limited, message_to_structured_limited, PayloadLimits};
use crate::record::{EventLogger, EventType, LogLevel, LogRecord};
use crate::sink::Sink;
use crate::status::Status;
use crate::time::{nanos_to_datetime, TimeProvider};

/// Error returned when a caller breaks the event contract.
///
/// These indicate wiring bugs in the interceptor layer, not runtime
/// conditions; sink failures never surface here.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LogHelperError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Builds [`LogRecord`]s from RPC events and hands them to a [`Sink`].
///
/// Holds no per-call state, so a single instance can be shared by every
/// call in flight.
#[derive(Clone)]
pub struct LogHelper {
    sink: Arc<dyn Sink>,
    time_provider: Arc<dyn TimeProvider>,
    limits: PayloadLimits,
}

impl LogHelper {
    pub fn new(sink: Arc<dyn Sink>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::with_limits(sink, time_provider, PayloadLimits::default())
    }

    /// Like [`LogHelper::new`], but caps embedded payload bytes.
    pub fn with_limits(
        sink: Arc<dyn Sink>,
        time_provider: Arc<dyn TimeProvider>,
        limits: PayloadLimits,
    ) -> Self {
        LogHelper {
            sink,
            time_provider,
            limits,
        }
    }

    /// Log the request header of a call.
    ///
    /// Only the server knows the remote end of the accepted connection, so
    /// `peer_address` must be `None` when `event_logger` is the client.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_request_header(
        &self,
        sequence_id: u64,
        service_name: &str,
        method_name: &str,
        authority: &str,
        timeout: Option<Duration>,
        metadata: &Metadata,
        event_logger: EventLogger,
        rpc_id: &str,
        peer_address: Option<&TransportAddress>,
    ) -> Result<(), LogHelperError> {
        if event_logger == EventLogger::Client && peer_address.is_some() {
            return Err(LogHelperError::InvalidArgument(
                "peer address can only be specified by server".to_string(),
            ));
        }

        let mut record = self.new_record(
            sequence_id,
            service_name,
            method_name,
            rpc_id,
            EventType::RequestHeader,
            event_logger,
        );
        self.attach_metadata(&mut record, metadata);
        record.authority = Some(authority.to_string());
        record.timeout = timeout;
        record.peer_address = peer_address.map(|peer| address_to_structured(Some(peer)));

        self.deliver(record).await;
        Ok(())
    }

    /// Log the response header of a call.
    ///
    /// Only the client side may supply `peer_address` here.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_response_header(
        &self,
        sequence_id: u64,
        service_name: &str,
        method_name: &str,
        metadata: &Metadata,
        event_logger: EventLogger,
        rpc_id: &str,
        peer_address: Option<&TransportAddress>,
    ) -> Result<(), LogHelperError> {
        if event_logger == EventLogger::Server && peer_address.is_some() {
            return Err(LogHelperError::InvalidArgument(
                "peer address can only be specified for client".to_string(),
            ));
        }

        let mut record = self.new_record(
            sequence_id,
            service_name,
            method_name,
            rpc_id,
            EventType::ResponseHeader,
            event_logger,
        );
        self.attach_metadata(&mut record, metadata);
        record.peer_address = peer_address.map(|peer| address_to_structured(Some(peer)));

        self.deliver(record).await;
        Ok(())
    }

    /// Log the trailers and final status of a call.
    ///
    /// The peer address is attached whenever supplied, from either side.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_trailer(
        &self,
        sequence_id: u64,
        service_name: &str,
        method_name: &str,
        status: &Status,
        metadata: &Metadata,
        event_logger: EventLogger,
        rpc_id: &str,
        peer_address: Option<&TransportAddress>,
    ) -> Result<(), LogHelperError> {
        let mut record = self.new_record(
            sequence_id,
            service_name,
            method_name,
            rpc_id,
            EventType::Trailer,
            event_logger,
        );
        self.attach_metadata(&mut record, metadata);
        record.peer_address = peer_address.map(|peer| address_to_structured(Some(peer)));
        record.status_code = Some(status.code().value());
        record.status_message = status
            .description()
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        self.deliver(record).await;
        Ok(())
    }

    /// Log a request or response message.
    ///
    /// `event_type` must be [`EventType::RequestMessage`] or
    /// [`EventType::ResponseMessage`].
    #[allow(clippy::too_many_arguments)]
    pub async fn log_rpc_message(
        &self,
        sequence_id: u64,
        service_name: &str,
        method_name: &str,
        event_type: EventType,
        message: impl Into<Bytes>,
        event_logger: EventLogger,
        rpc_id: &str,
    ) -> Result<(), LogHelperError> {
        if !matches!(
            event_type,
            EventType::RequestMessage | EventType::ResponseMessage
        ) {
            return Err(LogHelperError::InvalidArgument(format!(
                "event type must be a request or response message, got {:?}",
                event_type
            )));
        }

        let mut record = self.new_record(
            sequence_id,
            service_name,
            method_name,
            rpc_id,
            event_type,
            event_logger,
        );
        let built = message_to_structured_limited(message.into(), self.limits.max_message_bytes);
        record.message = Some(built.payload);
        record.payload_size = built.size;
        record.payload_truncated = built.truncated;

        self.deliver(record).await;
        Ok(())
    }

    /// Release the underlying sink.
    pub async fn close(&self) {
        self.sink.close().await;
    }

    fn new_record(
        &self,
        sequence_id: u64,
        service_name: &str,
        method_name: &str,
        rpc_id: &str,
        event_type: EventType,
        event_logger: EventLogger,
    ) -> LogRecord {
        LogRecord {
            timestamp: nanos_to_datetime(self.time_provider.current_time_nanos()),
            rpc_id: rpc_id.to_string(),
            service_name: service_name.to_string(),
            method_name: method_name.to_string(),
            sequence_id,
            event_type,
            event_logger,
            log_level: LogLevel::Debug,
            authority: None,
            peer_address: None,
            timeout: None,
            metadata: None,
            message: None,
            payload_size: 0,
            payload_truncated: false,
            status_code: None,
            status_message: None,
        }
    }

    fn attach_metadata(&self, record: &mut LogRecord, metadata: &Metadata) {
        let built = metadata_to_structured_limited(metadata, self.limits.max_metadata_bytes);
        record.metadata = Some(built.payload);
        record.payload_size = built.size;
        record.payload_truncated = built.truncated;
    }

    async fn deliver(&self, record: LogRecord) {
        tracing::trace!(
            rpc_id = %record.rpc_id,
            sequence_id = record.sequence_id,
            event_type = ?record.event_type,
            "handing rpc event to sink"
        );
        self.sink.write(&record).await;
    }
}

/// Fetch the transport peer address from a call's attributes.
pub fn extract_peer_address(attributes: &Attributes) -> Option<&TransportAddress> {
    attributes.get(&TRANSPORT_ATTR_REMOTE_ADDR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_sink::InMemorySink;
    use crate::payload::metadata_to_structured;
    use crate::record::{Address, AddressType};
    use crate::status::Code;
    use crate::time::FixedTimeProvider;
    use std::net::{Ipv4Addr, SocketAddr};

    const SEQ_ID: u64 = 1;
    const SERVICE: &str = "service";
    const METHOD: &str = "method";
    const AUTHORITY: &str = "authority";
    const RPC_ID: &str = "d155e885-9587-4e77-81f7-3aa5a443d47f";
    const NOW_NANOS: i64 = 9_876_000_054_321;

    fn non_empty_metadata() -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("a", "aaaaaaaaa");
        metadata.insert("b", "bbbbbbbbb");
        metadata.insert("c", "ccccccccc");
        metadata
    }

    fn peer() -> TransportAddress {
        TransportAddress::from(SocketAddr::from((Ipv4Addr::LOCALHOST, 12345)))
    }

    fn peer_structured() -> Address {
        Address {
            address_type: AddressType::Ipv4,
            address: "127.0.0.1".to_string(),
            ip_port: Some(12345),
        }
    }

    fn helper() -> (LogHelper, Arc<InMemorySink>) {
        let sink = Arc::new(InMemorySink::new());
        let helper = LogHelper::new(sink.clone(), Arc::new(FixedTimeProvider(NOW_NANOS)));
        (helper, sink)
    }

    fn base(event_type: EventType) -> LogRecord {
        let built = metadata_to_structured(&non_empty_metadata());
        LogRecord {
            timestamp: nanos_to_datetime(NOW_NANOS),
            rpc_id: RPC_ID.to_string(),
            service_name: SERVICE.to_string(),
            method_name: METHOD.to_string(),
            sequence_id: SEQ_ID,
            event_type,
            event_logger: EventLogger::Client,
            log_level: LogLevel::Debug,
            authority: None,
            peer_address: None,
            timeout: None,
            metadata: Some(built.payload),
            message: None,
            payload_size: built.size,
            payload_truncated: false,
            status_code: None,
            status_message: None,
        }
    }

    #[tokio::test]
    async fn request_header_on_client() {
        let (helper, sink) = helper();
        let timeout = Duration::from_millis(1234);
        helper
            .log_request_header(
                SEQ_ID,
                SERVICE,
                METHOD,
                AUTHORITY,
                Some(timeout),
                &non_empty_metadata(),
                EventLogger::Client,
                RPC_ID,
                None,
            )
            .await
            .unwrap();

        let expected = LogRecord {
            authority: Some(AUTHORITY.to_string()),
            timeout: Some(timeout),
            ..base(EventType::RequestHeader)
        };
        assert_eq!(sink.records().await, vec![expected]);
    }

    #[tokio::test]
    async fn request_header_on_server_carries_peer() {
        let (helper, sink) = helper();
        helper
            .log_request_header(
                SEQ_ID,
                SERVICE,
                METHOD,
                AUTHORITY,
                Some(Duration::from_millis(1234)),
                &non_empty_metadata(),
                EventLogger::Server,
                RPC_ID,
                Some(&peer()),
            )
            .await
            .unwrap();

        let record = &sink.records().await[0];
        assert_eq!(record.event_logger, EventLogger::Server);
        assert_eq!(record.peer_address, Some(peer_structured()));
    }

    #[tokio::test]
    async fn request_header_without_timeout_omits_it() {
        let (helper, sink) = helper();
        helper
            .log_request_header(
                SEQ_ID,
                SERVICE,
                METHOD,
                AUTHORITY,
                None,
                &non_empty_metadata(),
                EventLogger::Client,
                RPC_ID,
                None,
            )
            .await
            .unwrap();

        assert_eq!(sink.records().await[0].timeout, None);
    }

    #[tokio::test]
    async fn request_header_rejects_client_peer() {
        let (helper, sink) = helper();
        let err = helper
            .log_request_header(
                SEQ_ID,
                SERVICE,
                METHOD,
                AUTHORITY,
                None,
                &non_empty_metadata(),
                EventLogger::Client,
                RPC_ID,
                Some(&peer()),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("peer address can only be specified by server"));
        assert!(sink.records().await.is_empty());
    }

    #[tokio::test]
    async fn response_header_client_and_server() {
        let (helper, sink) = helper();
        helper
            .log_response_header(
                SEQ_ID,
                SERVICE,
                METHOD,
                &non_empty_metadata(),
                EventLogger::Client,
                RPC_ID,
                Some(&peer()),
            )
            .await
            .unwrap();
        helper
            .log_response_header(
                SEQ_ID,
                SERVICE,
                METHOD,
                &non_empty_metadata(),
                EventLogger::Server,
                RPC_ID,
                None,
            )
            .await
            .unwrap();

        let client = LogRecord {
            peer_address: Some(peer_structured()),
            ..base(EventType::ResponseHeader)
        };
        let server = LogRecord {
            event_logger: EventLogger::Server,
            ..base(EventType::ResponseHeader)
        };
        assert_eq!(sink.records().await, vec![client, server]);
    }

    #[tokio::test]
    async fn response_header_rejects_server_peer() {
        let (helper, _sink) = helper();
        let err = helper
            .log_response_header(
                SEQ_ID,
                SERVICE,
                METHOD,
                &non_empty_metadata(),
                EventLogger::Server,
                RPC_ID,
                Some(&peer()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LogHelperError::InvalidArgument(_)));
        assert!(err.to_string().contains("peer address can only be specified for client"));
    }

    #[tokio::test]
    async fn trailer_variants() {
        let (helper, sink) = helper();
        let status = Code::Internal.to_status().with_description("test description");

        // client with peer, server without peer, client without peer
        for (logger, peer_address) in [
            (EventLogger::Client, Some(peer())),
            (EventLogger::Server, None),
            (EventLogger::Client, None),
        ] {
            helper
                .log_trailer(
                    SEQ_ID,
                    SERVICE,
                    METHOD,
                    &status,
                    &non_empty_metadata(),
                    logger,
                    RPC_ID,
                    peer_address.as_ref(),
                )
                .await
                .unwrap();
        }
        // no description
        helper
            .log_trailer(
                SEQ_ID,
                SERVICE,
                METHOD,
                &Code::Internal.to_status(),
                &non_empty_metadata(),
                EventLogger::Client,
                RPC_ID,
                Some(&peer()),
            )
            .await
            .unwrap();

        let trailer = LogRecord {
            status_code: Some(13),
            status_message: Some("test description".to_string()),
            peer_address: Some(peer_structured()),
            ..base(EventType::Trailer)
        };
        let records = sink.records().await;
        assert_eq!(records[0], trailer);
        assert_eq!(
            records[1],
            LogRecord {
                event_logger: EventLogger::Server,
                peer_address: None,
                ..trailer.clone()
            }
        );
        assert_eq!(
            records[2],
            LogRecord {
                peer_address: None,
                ..trailer.clone()
            }
        );
        assert_eq!(
            records[3],
            LogRecord {
                status_message: None,
                ..trailer
            }
        );
    }

    #[tokio::test]
    async fn trailer_with_empty_description_omits_message() {
        let (helper, sink) = helper();
        helper
            .log_trailer(
                SEQ_ID,
                SERVICE,
                METHOD,
                &Code::Ok.to_status().with_description(""),
                &Metadata::new(),
                EventLogger::Server,
                RPC_ID,
                None,
            )
            .await
            .unwrap();

        let record = &sink.records().await[0];
        assert_eq!(record.status_code, Some(0));
        assert_eq!(record.status_message, None);
        assert_eq!(record.payload_size, 0);
    }

    #[tokio::test]
    async fn rpc_messages_both_directions_both_sides() {
        let (helper, sink) = helper();
        let message = vec![0u8; 100];

        for event_type in [EventType::RequestMessage, EventType::ResponseMessage] {
            for logger in [EventLogger::Client, EventLogger::Server] {
                helper
                    .log_rpc_message(
                        SEQ_ID,
                        SERVICE,
                        METHOD,
                        event_type,
                        message.clone(),
                        logger,
                        RPC_ID,
                    )
                    .await
                    .unwrap();
            }
        }

        let records = sink.records().await;
        assert_eq!(records.len(), 4);
        for record in &records {
            assert_eq!(record.message, Some(Bytes::from(message.clone())));
            assert_eq!(record.payload_size, 100);
            assert_eq!(record.metadata, None);
            assert_eq!(record.log_level, LogLevel::Debug);
        }
        assert_eq!(records[1].event_logger, EventLogger::Server);
        assert_eq!(records[2].event_type, EventType::ResponseMessage);
    }

    #[tokio::test]
    async fn rpc_message_rejects_header_event_type() {
        let (helper, sink) = helper();
        let err = helper
            .log_rpc_message(
                SEQ_ID,
                SERVICE,
                METHOD,
                EventType::Trailer,
                Bytes::new(),
                EventLogger::Client,
                RPC_ID,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LogHelperError::InvalidArgument(_)));
        assert!(sink.records().await.is_empty());
    }

    #[tokio::test]
    async fn limits_truncate_payloads() {
        let sink = Arc::new(InMemorySink::new());
        let helper = LogHelper::with_limits(
            sink.clone(),
            Arc::new(FixedTimeProvider(NOW_NANOS)),
            PayloadLimits {
                max_metadata_bytes: Some(20),
                max_message_bytes: Some(8),
            },
        );

        helper
            .log_response_header(
                SEQ_ID,
                SERVICE,
                METHOD,
                &non_empty_metadata(),
                EventLogger::Server,
                RPC_ID,
                None,
            )
            .await
            .unwrap();
        helper
            .log_rpc_message(
                SEQ_ID,
                SERVICE,
                METHOD,
                EventType::ResponseMessage,
                vec![7u8; 100],
                EventLogger::Server,
                RPC_ID,
            )
            .await
            .unwrap();

        let records = sink.records().await;
        assert_eq!(records[0].payload_size, 20);
        assert_eq!(records[0].metadata.as_ref().unwrap().entries.len(), 2);
        assert!(records[0].payload_truncated);
        assert_eq!(records[1].payload_size, 8);
        assert!(records[1].payload_truncated);
    }

    #[test]
    fn peer_address_lookup() {
        assert!(extract_peer_address(&Attributes::empty()).is_none());
        let attrs = Attributes::builder()
            .set(TRANSPORT_ATTR_REMOTE_ADDR, peer())
            .build();
        assert_eq!(extract_peer_address(&attrs), Some(&peer()));
    }
}
