use crate::env::{
    env_or, GCLOUD_PROJECT_ENV, GOOGLE_CLOUD_PROJECT_ENV, RPC_LOG_SINK_ACCESS_TOKEN_ENV,
    RPC_LOG_SINK_ENDPOINT_ENV,
};
use crate::record::{LogLevel, LogRecord};
use crate::sink::Sink;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::Mutex;

/// Records addressed to the logging backend itself are never forwarded,
/// otherwise logging its traffic would feed back into it.
pub const SERVICE_TO_EXCLUDE: &str = "google.logging.v2.LoggingServiceV2";

/// Log stream every entry is written to.
pub const DEFAULT_LOG_NAME: &str = "grpc";

pub const DEFAULT_ENDPOINT: &str = "https://logging.googleapis.com";

/// Upper bound on one `entries:write` round trip, body included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Cloud Logging severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Default,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Map a record's level onto the backend scale.
pub fn cloud_logging_level(level: LogLevel) -> Severity {
    match level {
        LogLevel::Trace | LogLevel::Debug => Severity::Debug,
        LogLevel::Info => Severity::Info,
        LogLevel::Warn => Severity::Warning,
        LogLevel::Error => Severity::Error,
        LogLevel::Critical => Severity::Critical,
        LogLevel::Unknown => Severity::Default,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub resource_type: String,
}

impl MonitoredResource {
    pub fn global() -> Self {
        MonitoredResource {
            resource_type: "global".to_string(),
        }
    }
}

/// One entry of an `entries:write` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub log_name: String,
    pub resource: MonitoredResource,
    pub severity: Severity,
    pub json_payload: serde_json::Value,
}

#[derive(thiserror::Error, Debug)]
pub enum CloudLoggingError {
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("http request failed: {0}")]
    Http(String),

    #[error("cloud logging rejected entries with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no project id configured and none found in the environment")]
    MissingProject,
}

/// Handle to the remote logging service.
///
/// A [`CloudLoggingSink`] owns exactly one client and calls it from one
/// task at a time.
#[async_trait]
pub trait LoggingClient: Send + Sync {
    async fn write_entries(&self, entries: Vec<LogEntry>) -> Result<(), CloudLoggingError>;

    async fn close(&self) -> Result<(), CloudLoggingError>;
}

/// Configuration for [`CloudLoggingSink::new`].
#[derive(Clone, Debug)]
pub struct CloudLoggingConfig {
    /// Destination project. `None` or empty resolves from the environment.
    pub project_id: Option<String>,
    /// Base URL of the logging API, e.g. "https://logging.googleapis.com".
    pub endpoint: String,
    /// OAuth2 bearer token sent with every request.
    pub access_token: Option<String>,
    /// Deadline for a single request. Writers queue behind an in-flight
    /// request, so this also bounds how long any of them can wait.
    pub request_timeout: Duration,
}

impl Default for CloudLoggingConfig {
    fn default() -> Self {
        CloudLoggingConfig {
            project_id: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl CloudLoggingConfig {
    /// Build a config for `project_id`, taking endpoint and token from the
    /// environment.
    pub fn from_env(project_id: Option<String>) -> Self {
        CloudLoggingConfig {
            project_id,
            endpoint: env_or(RPC_LOG_SINK_ENDPOINT_ENV, DEFAULT_ENDPOINT),
            access_token: std::env::var(RPC_LOG_SINK_ACCESS_TOKEN_ENV)
                .ok()
                .filter(|t| !t.is_empty()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Resolve the destination project, falling back to the ambient
/// `GOOGLE_CLOUD_PROJECT` / `GCLOUD_PROJECT` variables.
pub fn resolve_project_id(project_id: Option<&str>) -> Result<String, CloudLoggingError> {
    if let Some(id) = project_id.filter(|id| !id.is_empty()) {
        return Ok(id.to_string());
    }
    [GOOGLE_CLOUD_PROJECT_ENV, GCLOUD_PROJECT_ENV]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|id| !id.is_empty())
        .ok_or(CloudLoggingError::MissingProject)
}

enum SinkState {
    Open(Box<dyn LoggingClient>),
    Closed,
}

/// [`Sink`] writing records to Google Cloud Logging.
///
/// Each record becomes one entry with a JSON payload keyed by the record's
/// schema field names. Submission and the open/closed check share one lock,
/// so concurrent writers never race a concurrent `close`.
pub struct CloudLoggingSink {
    log_name: String,
    state: Mutex<SinkState>,
}

impl CloudLoggingSink {
    /// Construct a sink talking to the Cloud Logging HTTP API.
    ///
    /// **Parameters**
    /// - `config`: [`CloudLoggingConfig`] with destination project,
    ///   endpoint and optional token.
    ///
    /// **Returns**
    /// - A ready-to-use sink, or [`CloudLoggingError::MissingProject`] when
    ///   no project id is configured or discoverable.
    #[cfg(feature = "cloud-logging")]
    pub fn new(config: CloudLoggingConfig) -> Result<Self, CloudLoggingError> {
        let project_id = resolve_project_id(config.project_id.as_deref())?;
        let client = HttpLoggingClient::new(
            config.endpoint,
            config.access_token,
            config.request_timeout,
        )?;
        Ok(Self::with_client(project_id, Box::new(client)))
    }

    /// Construct a sink around an existing backend handle.
    pub fn with_client(project_id: impl Into<String>, client: Box<dyn LoggingClient>) -> Self {
        let project_id = project_id.into();
        CloudLoggingSink {
            log_name: format!(
                "projects/{}/logs/{}",
                project_id,
                urlencoding::encode(DEFAULT_LOG_NAME)
            ),
            state: Mutex::new(SinkState::Open(client)),
        }
    }

    pub fn log_name(&self) -> &str {
        &self.log_name
    }

    fn map_record(&self, record: &LogRecord) -> Result<LogEntry, CloudLoggingError> {
        Ok(LogEntry {
            log_name: self.log_name.clone(),
            resource: MonitoredResource::global(),
            severity: cloud_logging_level(record.log_level),
            json_payload: record.to_json()?,
        })
    }
}

#[async_trait]
impl Sink for CloudLoggingSink {
    async fn write(&self, record: &LogRecord) {
        if record.service_name == SERVICE_TO_EXCLUDE {
            return;
        }
        let entry = match self.map_record(record) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::error!(error = %e, rpc_id = %record.rpc_id, "failed to build cloud logging entry");
                return;
            }
        };

        let state = self.state.lock().await;
        let client = match &*state {
            SinkState::Open(client) => client,
            SinkState::Closed => {
                tracing::error!(rpc_id = %record.rpc_id, "attempt to write after CloudLoggingSink is closed");
                return;
            }
        };

        tracing::trace!(event_type = ?record.event_type, "writing rpc event to cloud logging");
        if let Err(e) = client.write_entries(vec![entry]).await {
            tracing::error!(error = %e, rpc_id = %record.rpc_id, "caught error while writing to cloud logging");
        }
    }

    async fn close(&self) {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, SinkState::Closed) {
            SinkState::Closed => {
                tracing::warn!("attempt to close after CloudLoggingSink is closed");
            }
            SinkState::Open(client) => {
                if let Err(e) = client.close().await {
                    tracing::error!(error = %e, "caught error while closing cloud logging client");
                }
            }
        }
    }
}

#[cfg(feature = "cloud-logging")]
pub use http::HttpLoggingClient;

#[cfg(feature = "cloud-logging")]
mod http {
    use super::{CloudLoggingError, LogEntry, LoggingClient};
    use async_trait::async_trait;
    use reqwest::Client;
    use serde::Serialize;
    use std::time::Duration;

    /// [`LoggingClient`] calling the `v2/entries:write` REST method.
    #[derive(Clone)]
    pub struct HttpLoggingClient {
        client: Client,
        endpoint: String,
        access_token: Option<String>,
    }

    #[derive(Serialize)]
    struct WriteEntriesRequest<'a> {
        entries: &'a [LogEntry],
    }

    impl HttpLoggingClient {
        pub fn new(
            endpoint: impl Into<String>,
            access_token: Option<String>,
            request_timeout: Duration,
        ) -> Result<Self, CloudLoggingError> {
            let client = Client::builder()
                .timeout(request_timeout)
                .build()
                .map_err(|e| CloudLoggingError::Http(e.to_string()))?;
            Ok(HttpLoggingClient {
                client,
                endpoint: endpoint.into(),
                access_token,
            })
        }

        fn url(&self) -> String {
            format!("{}/v2/entries:write", self.endpoint.trim_end_matches('/'))
        }
    }

    #[async_trait]
    impl LoggingClient for HttpLoggingClient {
        async fn write_entries(&self, entries: Vec<LogEntry>) -> Result<(), CloudLoggingError> {
            let mut request = self
                .client
                .post(self.url())
                .json(&WriteEntriesRequest { entries: &entries });
            if let Some(token) = &self.access_token {
                request = request.bearer_auth(token);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| CloudLoggingError::Http(e.to_string()))?;
            if resp.status().is_success() {
                Ok(())
            } else {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
                Err(CloudLoggingError::Status { status, body })
            }
        }

        async fn close(&self) -> Result<(), CloudLoggingError> {
            // reqwest releases pooled connections when the client drops.
            Ok(())
        }
    }

}
