//! Structured logging setup.
//!
//! Installs a global `tracing` subscriber: an `EnvFilter` plus a pretty
//! (development) or JSON (containers) `fmt` layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{LogFormat, TelemetryConfig, TelemetryError};

/// Build the level filter for `config`.
///
/// `RUST_LOG` wins when set and valid; otherwise `config.filter`.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| TelemetryError::Config(e.to_string()))
}

/// Install the global subscriber.
///
/// Fails with [`TelemetryError::LoggingInit`] if a global subscriber is
/// already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Off => registry.try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(true),
            )
            .try_init(),
    };
    installed.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        format = ?config.format,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_crate_directive_accepted() {
        let config =
            TelemetryConfig::for_service("qc-tests").with_filter("warn,qc_18_chain_query=debug");
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = TelemetryConfig::for_service("qc-tests").with_format(LogFormat::Off);
        // The first call may lose to another test in this binary
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::LoggingInit(_))
        ));
    }
}
