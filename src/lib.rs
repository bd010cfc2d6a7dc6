pub mod record;
pub mod status;
pub mod metadata;
pub mod attributes;
pub mod address;
pub mod payload;
pub mod time;
pub mod helper;
pub mod sink;

pub mod cloud;
pub mod backend;
pub mod env;
pub mod init;
pub mod memory_sink;
pub mod noop_sink;

pub use address::TransportAddress;
pub use helper::{extract_peer_address, LogHelper, LogHelperError};
pub use metadata::Metadata;
pub use record::{EventLogger, EventType, LogLevel, LogRecord};
pub use sink::Sink;
pub use status::{Code, Status};
