//! # Quantum Telemetry
//!
//! Logging bootstrap for the chain-data services.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quantum_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> Result<(), quantum_telemetry::TelemetryError> {
//!     init_logging(&TelemetryConfig::from_env("qc-18-chain-query")?)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | unset | Filter directive, wins over everything else |
//! | `QC_LOG_LEVEL` | `info` | Filter directive |
//! | `QC_LOG_FORMAT` | `pretty` (`json` in containers) | `pretty`, `json` or `off` |

mod config;
mod logging;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
