use std::time::Duration;

use tracing::info;
use rpc_log_sink::{
    init::{init_logging, LoggingConfig},
    EventLogger, Metadata,
};

#[tokio::main]
async fn main() {
    // Example DSN: cloudlogging://my-project
    // With `cloudlogging://` the project comes from GOOGLE_CLOUD_PROJECT and
    // the token from RPC_LOG_SINK_ACCESS_TOKEN.
    let helper = init_logging(LoggingConfig::from_env()).expect("failed to build cloud logging sink");

    info!("cloud logging example started");
    helper
        .log_request_header(
            1,
            "helloworld.Greeter",
            "SayHello",
            "localhost:50051",
            Some(Duration::from_secs(1)),
            &Metadata::new(),
            EventLogger::Client,
            "d155e885-9587-4e77-81f7-3aa5a443d47f",
            None,
        )
        .await
        .expect("valid event");
    helper.close().await;
}
