//! Logging configuration.

use crate::TelemetryError;
use std::env;
use std::str::FromStr;

/// Where log lines go and how they look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored
    Pretty,
    /// One JSON object per line
    Json,
    /// Filter installed, nothing written
    Off,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "off" | "none" => Ok(Self::Off),
            other => Err(TelemetryError::Config(format!("unknown log format {other:?}"))),
        }
    }
}

/// Logging setup for one chain-data service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Attached to the startup log line
    pub service_name: String,
    /// `EnvFilter` directive, e.g. `info,qc_18_chain_query=debug`
    pub filter: String,
    pub format: LogFormat,
}

impl TelemetryConfig {
    /// Pretty output at `info` for `service_name`.
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Read overrides from the environment.
    ///
    /// - `QC_LOG_LEVEL`: filter directive (default `info`)
    /// - `QC_LOG_FORMAT`: `pretty`, `json` or `off` (default `json` inside
    ///   a container, `pretty` elsewhere)
    pub fn from_env(service_name: impl Into<String>) -> Result<Self, TelemetryError> {
        let in_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        let mut config = Self::for_service(service_name);
        if in_container {
            config.format = LogFormat::Json;
        }
        if let Ok(filter) = env::var("QC_LOG_LEVEL") {
            config.filter = filter;
        }
        if let Ok(format) = env::var("QC_LOG_FORMAT") {
            config.format = format.parse()?;
        }
        Ok(config)
    }
}
