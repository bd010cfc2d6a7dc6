use crate::backend::{make_sink_from_config, parse_dsn, BackendBuildError, DsnError};
use crate::env::{env_or, RPC_LOG_SINK_DSN_ENV};
use crate::helper::LogHelper;
use crate::payload::PayloadLimits;
use crate::time::SystemTimeProvider;
use std::sync::Arc;

/// Settings for [`init_logging`].
///
/// **Fields**
/// - `dsn`: sink selection, see [`parse_dsn`].
/// - `limits`: optional payload ceilings; unset means records carry
///   payloads whole.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` subscriber is
///   installed so sink diagnostics show up on the console.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub dsn: String,
    pub limits: PayloadLimits,
    pub enable_stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dsn: "cloudlogging://".to_string(),
            limits: PayloadLimits::default(),
            enable_stdout: true,
        }
    }
}

impl LoggingConfig {
    /// Defaults, with the DSN taken from `RPC_LOG_SINK_DSN` when set.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            dsn: env_or(RPC_LOG_SINK_DSN_ENV, &default.dsn),
            ..default
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Dsn(#[from] DsnError),

    #[error(transparent)]
    Backend(#[from] BackendBuildError),
}

/// Build a [`LogHelper`] backed by the sink selected in `config`.
///
/// **Effects**
///
/// When `enable_stdout` is set this tries to install a global `fmt`
/// subscriber. An already installed subscriber is left in place.
pub fn init_logging(config: LoggingConfig) -> Result<LogHelper, InitError> {
    if config.enable_stdout {
        // Err only means the host application already installed one.
        let _ = tracing_subscriber::fmt().try_init();
    }

    let backend = parse_dsn(&config.dsn)?;
    let sink = make_sink_from_config(&backend)?;
    tracing::debug!(dsn = %config.dsn, kind = ?backend.kind, "rpc log sink ready");
    Ok(LogHelper::with_limits(
        sink,
        Arc::new(SystemTimeProvider),
        config.limits,
    ))
}
