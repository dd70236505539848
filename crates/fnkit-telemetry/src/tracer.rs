//! Subscriber and tracer setup

use crate::attributes::SYSTEM_NAME;
use fnkit_core::{Error, LogFormat, ObservabilityConfig, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{SimpleSpanProcessor, TracerProvider};
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Global tracer provider holder
static TRACER_PROVIDER: OnceLock<Arc<TracerProvider>> = OnceLock::new();

/// Span processor builders registered before initialization
type ProcessorBuilder = Box<dyn FnOnce() -> SimpleSpanProcessor + Send>;
static SPAN_PROCESSOR_BUILDERS: Mutex<Option<Vec<ProcessorBuilder>>> = Mutex::new(Some(Vec::new()));

/// Registers a span processor (exporter) for the OpenTelemetry layer.
///
/// Must be called before [`init_telemetry`]; later registrations are ignored
/// with a warning. Returns whether the processor was accepted.
pub fn register_span_processor(builder: ProcessorBuilder) -> bool {
    let Ok(mut builders) = SPAN_PROCESSOR_BUILDERS.lock() else {
        return false;
    };

    match builders.as_mut() {
        Some(pending) => {
            pending.push(builder);
            true
        }
        None => {
            tracing::warn!("Span processor registered after telemetry initialization");
            false
        }
    }
}

/// Installs the global tracing subscriber described by `config`.
///
/// Layers: an `EnvFilter` built from `config.log_filter` (the `RUST_LOG`
/// environment variable wins when set), one fmt layer in the configured
/// format, and the OpenTelemetry layer when `otel_enabled` is set.
///
/// Returns `Ok(false)` if a global subscriber was already installed.
///
/// # Example
///
/// ```rust,no_run
/// use fnkit_core::ObservabilityConfig;
/// use fnkit_telemetry::init_telemetry;
///
/// init_telemetry(&ObservabilityConfig::default()).unwrap();
/// ```
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<bool> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .map_err(|e| Error::config_error(format!("invalid log filter: {}", e)))?;

    let otel_layer = if config.otel_enabled {
        let service_name = config
            .service_name
            .clone()
            .unwrap_or_else(|| SYSTEM_NAME.to_string());
        let tracer = build_tracer_provider().tracer(service_name);
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let json_layer = (config.log_format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
    });
    let compact_layer = (config.log_format == LogFormat::Compact)
        .then(|| tracing_subscriber::fmt::layer().compact().with_target(false));
    let pretty_layer = (config.log_format == LogFormat::Pretty).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_line_number(true)
    });

    let installed = tracing_subscriber::registry()
        .with(otel_layer)
        .with(json_layer)
        .with(compact_layer)
        .with(pretty_layer)
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            format = ?config.log_format,
            otel = config.otel_enabled,
            "Telemetry initialized"
        );
    }

    Ok(installed)
}

fn build_tracer_provider() -> Arc<TracerProvider> {
    TRACER_PROVIDER
        .get_or_init(|| {
            let builders = SPAN_PROCESSOR_BUILDERS
                .lock()
                .ok()
                .and_then(|mut guard| guard.take())
                .unwrap_or_default();

            let mut provider_builder = TracerProvider::builder();
            for builder in builders {
                provider_builder = provider_builder.with_span_processor(builder());
            }
            Arc::new(provider_builder.build())
        })
        .clone()
}

/// Get the global tracer provider if the OpenTelemetry layer was installed
pub fn tracer_provider() -> Option<Arc<TracerProvider>> {
    TRACER_PROVIDER.get().cloned()
}
