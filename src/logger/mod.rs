//! Tracing and metrics setup for applications embedding the client.
//!
//! The client itself only emits `tracing` events and `metrics` samples; nothing
//! is installed unless the host calls [`initialize`].

mod config;

use std::net::SocketAddr;

pub use config::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// What [`initialize`] managed to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installed {
    pub subscriber: bool,
    pub metrics_exporter: bool,
}

/// Installs a global subscriber and, if enabled, a Prometheus exporter.
///
/// Never fails: a host that already owns the global subscriber or recorder
/// keeps it, and the result reports which parts were skipped.
pub fn initialize(logger_config: &LoggerConfig, telemetry_config: &TelemetryConfig) -> Installed {
    let subscriber = install_subscriber(logger_config);
    let metrics_exporter = telemetry_config.metrics.enabled
        && install_metrics_exporter(&telemetry_config.metrics.bind_address);

    Installed {
        subscriber,
        metrics_exporter,
    }
}

/// `RUST_LOG` wins over the configured level.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn install_subscriber(logger_config: &LoggerConfig) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter(&logger_config.level));

    let result = match logger_config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_line_number(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
    };

    match result {
        Ok(()) => true,
        Err(error) => {
            tracing::debug!(error = %error, "Keeping existing global subscriber");
            false
        }
    }
}

fn install_metrics_exporter(bind_address: &str) -> bool {
    let address: SocketAddr = match bind_address.parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::warn!(
                bind_address,
                error = %error,
                "Invalid metrics bind address; exporter not started"
            );
            return false;
        }
    };

    match PrometheusBuilder::new().with_http_listener(address).install() {
        Ok(()) => {
            tracing::info!(bind_address = %address, "Prometheus exporter listening");
            true
        }
        Err(error) => {
            tracing::warn!(
                bind_address = %address,
                error = %error,
                "Failed to start Prometheus exporter"
            );
            false
        }
    }
}
