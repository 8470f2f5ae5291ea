use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with an OTLP export pipeline and a JSON fmt layer.
///
/// If the OTLP exporter cannot be installed (no collector in dev/test),
/// logging falls back to the fmt layer alone rather than aborting startup.
pub fn init_tracing(service_name: &str, log_level: &str, otlp_endpoint: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(otlp_endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION").to_string()),
        ])))
        .install_batch(runtime::Tokio);

    // The fmt layer is built in each arm because its subscriber type
    // parameter differs with and without the telemetry layer.
    match tracer {
        Ok(tracer) => {
            let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(telemetry)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_file(true)
                        .with_line_number(true)
                        .json()
                        .flatten_event(true),
                )
                .init();
        }
        Err(e) => {
            eprintln!(
                "OTLP tracer unavailable for service '{}' at '{}' ({}); logging to stdout only",
                service_name, otlp_endpoint, e
            );
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_file(true)
                        .with_line_number(true)
                        .json()
                        .flatten_event(true),
                )
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    // One test per process: init installs the global subscriber.
    #[tokio::test(flavor = "multi_thread")]
    async fn init_tracing_installs_a_subscriber() {
        super::init_tracing("test-service", "info", "http://127.0.0.1:4317");
        tracing::info!("tracing initialized");
    }
}
