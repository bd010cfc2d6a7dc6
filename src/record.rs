use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Lifecycle point of an RPC that a [`LogRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventType {
    #[serde(rename = "GRPC_CALL_REQUEST_HEADER")]
    RequestHeader,
    #[serde(rename = "GRPC_CALL_RESPONSE_HEADER")]
    ResponseHeader,
    #[serde(rename = "GRPC_CALL_TRAILER")]
    Trailer,
    #[serde(rename = "GRPC_CALL_REQUEST_MESSAGE")]
    RequestMessage,
    #[serde(rename = "GRPC_CALL_RESPONSE_MESSAGE")]
    ResponseMessage,
}

/// Side of the call that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventLogger {
    #[serde(rename = "LOGGER_CLIENT")]
    Client,
    #[serde(rename = "LOGGER_SERVER")]
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogLevel {
    #[serde(rename = "LOG_LEVEL_UNKNOWN")]
    Unknown,
    #[serde(rename = "LOG_LEVEL_TRACE")]
    Trace,
    #[serde(rename = "LOG_LEVEL_DEBUG")]
    Debug,
    #[serde(rename = "LOG_LEVEL_INFO")]
    Info,
    #[serde(rename = "LOG_LEVEL_WARN")]
    Warn,
    #[serde(rename = "LOG_LEVEL_ERROR")]
    Error,
    #[serde(rename = "LOG_LEVEL_CRITICAL")]
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AddressType {
    #[default]
    #[serde(rename = "TYPE_UNKNOWN")]
    Unknown,
    #[serde(rename = "TYPE_IPV4")]
    Ipv4,
    #[serde(rename = "TYPE_IPV6")]
    Ipv6,
    #[serde(rename = "TYPE_UNIX")]
    Unix,
}

/// Structured form of a transport peer address.
///
/// `ip_port` is only set for IPv4 and IPv6 peers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Address {
    #[serde(rename = "type")]
    pub address_type: AddressType,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_port: Option<u16>,
}

/// One header entry, value kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    pub key: String,
    #[serde(serialize_with = "base64_bytes::serialize")]
    pub value: Bytes,
}

/// Header payload in the order the caller supplied the entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MetadataPayload {
    #[serde(rename = "entry", skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<MetadataEntry>,
}

/// Canonical structured record produced for every observed RPC event.
///
/// Field names of the serialized form are part of the compatibility
/// surface with downstream consumers and must not change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub rpc_id: String,
    pub service_name: String,
    pub method_name: String,
    #[serde(serialize_with = "u64_string::serialize")]
    pub sequence_id: u64,
    pub event_type: EventType,
    pub event_logger: EventLogger,
    pub log_level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_address: Option<Address>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "duration_json::serialize"
    )]
    pub timeout: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataPayload>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "base64_bytes::serialize_opt"
    )]
    pub message: Option<Bytes>,
    #[serde(serialize_with = "u64_string::serialize")]
    pub payload_size: u64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub payload_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl LogRecord {
    /// Render the record as a JSON object using its schema field names.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

mod base64_bytes {
    use base64::Engine;
    use bytes::Bytes;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(value))
    }

    pub fn serialize_opt<S: Serializer>(
        value: &Option<Bytes>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serialize(bytes, serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// 64-bit integers are written as decimal strings, as the proto3 JSON
/// mapping requires.
mod u64_string {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }
}

/// Durations are written as decimal seconds with an `s` suffix, using
/// 0, 3, 6 or 9 fractional digits (`"1.234s"`).
mod duration_json {
    use serde::Serializer;
    use std::time::Duration;

    pub fn format(value: Duration) -> String {
        let secs = value.as_secs();
        let nanos = value.subsec_nanos();
        if nanos == 0 {
            format!("{}s", secs)
        } else if nanos % 1_000_000 == 0 {
            format!("{}.{:03}s", secs, nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            format!("{}.{:06}s", secs, nanos / 1_000)
        } else {
            format!("{}.{:09}s", secs, nanos)
        }
    }

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&format(*d)),
            None => serializer.serialize_none(),
        }
    }
}
