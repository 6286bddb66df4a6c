//! Logging and OpenTelemetry export.

use std::str::FromStr;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::{
    metrics::SdkMeterProvider, propagation::TraceContextPropagator, trace as sdktrace,
};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,lnrelay_app=debug,lnrelay_hex=debug";
const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Shape of the log lines written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}', expected pretty or json")),
        }
    }
}

/// Providers to flush on exit. Empty when no collector is configured.
pub struct Telemetry {
    tracer_provider: Option<sdktrace::SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl Telemetry {
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to flush traces: {e}");
            }
        }
        if let Some(provider) = self.meter_provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to flush metrics: {e}");
            }
        }
    }
}

/// Installs the global subscriber.
///
/// Spans and HTTP metrics are exported over OTLP only when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set; otherwise logging stays local.
pub fn init(format: LogFormat) -> anyhow::Result<Telemetry> {
    let otlp_enabled = std::env::var_os(OTLP_ENDPOINT_VAR).is_some();

    let (tracer_provider, meter_provider) = if otlp_enabled {
        let (tracer, meter) = init_otlp()?;
        (Some(tracer), Some(meter))
    } else {
        (None, None)
    };

    let fmt_layer = match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer("lnrelay-server"))
    });

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(otel_layer)
        .try_init()?;

    if otlp_enabled {
        tracing::info!("exporting traces and metrics over OTLP");
    }

    Ok(Telemetry {
        tracer_provider,
        meter_provider,
    })
}

fn init_otlp() -> anyhow::Result<(sdktrace::SdkTracerProvider, SdkMeterProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let span_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;
    let tracer_provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter)
        .build();
    global::set_tracer_provider(tracer_provider.clone());

    // HTTP metrics from the router are recorded against the global meter provider.
    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .build()?;
    let meter_provider = SdkMeterProvider::builder()
        .with_periodic_exporter(metric_exporter)
        .build();
    global::set_meter_provider(meter_provider.clone());

    Ok((tracer_provider, meter_provider))
}
