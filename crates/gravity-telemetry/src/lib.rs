//! # Gravity Telemetry
//!
//! Logging and metrics exposition for Gravity Core nodes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gravity_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GC_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `GC_JSON_LOGS` | `false` | JSON log lines |
//! | `GC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `GC_SERVICE_NAME` | `gravity-core` | Service name in logs |
//! | `GC_NETWORK` | `devnet` | Network name in logs |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{encode_metrics, record_block, CONSULS, LEDGER_HEIGHT, MEMPOOL_PENDING};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber already installed or failed to build
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Registry could not be rendered
    #[error("Failed to render Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Bad filter or setting
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and touch the node gauges so they are exported from
/// the first scrape.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    record_block(0, 0, 0);
    Ok(())
}
