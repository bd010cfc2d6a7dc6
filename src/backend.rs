use std::sync::Arc;

use crate::sink::Sink;

/// Supported backend kinds that can be selected via DSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    CloudLogging,
    Noop,
    Memory,
}

/// Backend selection parsed from a DSN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Selected backend implementation.
    pub kind: BackendKind,
    /// Raw DSN that was used to construct this config.
    pub dsn: String,
}

impl BackendConfig {
    pub fn new(kind: BackendKind, dsn: impl Into<String>) -> Self {
        BackendConfig { kind, dsn: dsn.into() }
    }

    /// Project id carried in a `cloudlogging://` DSN, if any.
    ///
    /// An empty authority means "resolve from the environment".
    pub fn project_id(&self) -> Option<String> {
        if self.kind != BackendKind::CloudLogging {
            return None;
        }
        let rest = self.dsn.get("cloudlogging://".len()..).unwrap_or("");
        let project = rest.split('/').next().unwrap_or("");
        if project.is_empty() {
            None
        } else {
            Some(project.to_string())
        }
    }
}

/// Parse a DSN string and infer the backend kind from its scheme.
///
/// Examples:
/// - "cloudlogging://my-project"
/// - "cloudlogging://" (project from `GOOGLE_CLOUD_PROJECT`)
/// - "noop://"
/// - "memory://"
pub fn parse_dsn(dsn: &str) -> Result<BackendConfig, DsnError> {
    let lower = dsn.to_ascii_lowercase();

    if lower.starts_with("cloudlogging://") {
        Ok(BackendConfig::new(BackendKind::CloudLogging, dsn))
    } else if lower.starts_with("noop://") {
        Ok(BackendConfig::new(BackendKind::Noop, dsn))
    } else if lower.starts_with("memory://") {
        Ok(BackendConfig::new(BackendKind::Memory, dsn))
    } else {
        Err(DsnError::UnknownScheme)
    }
}

/// Error type returned when parsing a DSN.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DsnError {
    #[error("unknown or unsupported DSN scheme")]
    UnknownScheme,
}

/// Error type returned when building a sink from configuration.
#[derive(thiserror::Error, Debug)]
pub enum BackendBuildError {
    #[error("cloud-logging feature is not enabled")]
    CloudLoggingFeatureDisabled,

    #[error(transparent)]
    CloudLogging(#[from] crate::cloud::CloudLoggingError),
}

/// Create a concrete [`Sink`] implementation from a [`BackendConfig`].
///
/// This is the main entry point for applications that want to select
/// a backend using a single DSN string instead of constructing sinks
/// manually.
pub fn make_sink_from_config(cfg: &BackendConfig) -> Result<Arc<dyn Sink>, BackendBuildError> {
    match cfg.kind {
        BackendKind::CloudLogging => {
            #[cfg(feature = "cloud-logging")]
            {
                use crate::cloud::{CloudLoggingConfig, CloudLoggingSink};

                let config = CloudLoggingConfig::from_env(cfg.project_id());
                let sink = CloudLoggingSink::new(config)?;
                Ok(Arc::new(sink) as Arc<dyn Sink>)
            }

            #[cfg(not(feature = "cloud-logging"))]
            {
                Err(BackendBuildError::CloudLoggingFeatureDisabled)
            }
        }
        BackendKind::Noop => Ok(Arc::new(crate::noop_sink::NoopSink) as Arc<dyn Sink>),
        BackendKind::Memory => {
            Ok(Arc::new(crate::memory_sink::InMemorySink::new()) as Arc<dyn Sink>)
        }
    }
}
