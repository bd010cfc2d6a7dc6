//! Environment variable names used by this crate for convenient
//! configuration of sinks from services.
//!
//! These are purely helpers; [`LogHelper`](crate::helper::LogHelper)
//! itself never reads the environment.

/// Sink DSN, e.g. `cloudlogging://my-project` or `noop://`.
pub const RPC_LOG_SINK_DSN_ENV: &str = "RPC_LOG_SINK_DSN";

/// Base URL of the Cloud Logging API.
pub const RPC_LOG_SINK_ENDPOINT_ENV: &str = "RPC_LOG_SINK_ENDPOINT";

/// Optional OAuth2 bearer token for Cloud Logging.
pub const RPC_LOG_SINK_ACCESS_TOKEN_ENV: &str = "RPC_LOG_SINK_ACCESS_TOKEN";

/// Ambient project id, consulted when no project is configured.
pub const GOOGLE_CLOUD_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Legacy spelling of [`GOOGLE_CLOUD_PROJECT_ENV`].
pub const GCLOUD_PROJECT_ENV: &str = "GCLOUD_PROJECT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
