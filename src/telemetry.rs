//! Logging and tracing initialization
//!
//! Sets up the `tracing` subscriber with console output and, when enabled,
//! OpenTelemetry OTLP span export. Degrades gracefully to console-only
//! logging when the collector is unavailable.

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for logging and tracing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Whether OpenTelemetry export is enabled
    #[serde(default)]
    pub enabled: bool,

    /// OTLP endpoint URL (gRPC)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Service name attached to exported spans
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Log level filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "weathervane".to_string()
}

fn default_log_filter() -> String {
    "weathervane=info,tower_http=info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            service_name: default_service_name(),
            log_filter: default_log_filter(),
        }
    }
}

/// Guard that shuts down the tracer provider when dropped
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard")
            .field("active", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down tracer provider: {e:?}");
            }
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Returns a guard that must be kept alive for the lifetime of the
/// process; dropping it flushes pending spans.
pub fn init(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    if !config.enabled {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
        info!("Telemetry initialized (console only)");
        return Ok(TelemetryGuard { provider: None });
    }

    match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.endpoint)
        .build()
    {
        Ok(exporter) => {
            let resource = Resource::builder()
                .with_service_name(config.service_name.clone())
                .build();
            let provider = SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .with_sampler(Sampler::AlwaysOn)
                .with_resource(resource)
                .build();
            let tracer = provider.tracer(config.service_name.clone());

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .with(OpenTelemetryLayer::new(tracer))
                .try_init()?;

            info!(
                endpoint = %config.endpoint,
                service = %config.service_name,
                "Telemetry initialized with OTLP export"
            );
            Ok(TelemetryGuard {
                provider: Some(provider),
            })
        }
        Err(e) => {
            // Collector unreachable: keep serving with console-only logs
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
            warn!(
                endpoint = %config.endpoint,
                error = %e,
                "OTLP exporter unavailable, falling back to console-only logging"
            );
            Ok(TelemetryGuard { provider: None })
        }
    }
}
