use std::io::IsTerminal;

use anyhow::{Context, Result};
use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::{Protocol, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{SERVICE_NAME, SERVICE_VERSION},
    resource::DEPLOYMENT_ENVIRONMENT_NAME,
};
use tonic::metadata::MetadataMap;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::env::Config;

fn resource(config: &Config) -> Resource {
    Resource::builder()
        .with_schema_url(
            [
                KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, config.profile.clone()),
            ],
            SCHEMA_URL,
        )
        .build()
}

fn init_tracer_provider(config: &Config, endpoint: &str) -> Result<SdkTracerProvider> {
    let mut metadata = MetadataMap::new();
    if let Some(api_key) = &config.honeycomb_api_key {
        metadata.insert(
            "x-honeycomb-team",
            api_key
                .parse()
                .context("HONEYCOMB_API_KEY is not a valid header value")?,
        );
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_protocol(Protocol::Grpc)
        .with_metadata(metadata)
        .build()
        .context("Failed to build OTLP span exporter")?;

    Ok(SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource(config))
        .with_batch_exporter(exporter)
        .build())
}

/// Production output is collected by a log shipper, never read on a terminal.
fn use_ansi(config: &Config) -> bool {
    !config.is_production() && std::io::stderr().is_terminal()
}

pub struct OtelGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

/// Installs the global subscriber. Spans are exported over OTLP only when an
/// endpoint is configured; otherwise logs go to stderr alone.
pub fn init_tracing(config: &Config) -> Result<OtelGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let tracer_provider = match &config.otlp_endpoint {
        Some(endpoint) => Some(init_tracer_provider(config, endpoint)?),
        None => None,
    };

    let otel_layer = tracer_provider
        .as_ref()
        .map(|provider| OpenTelemetryLayer::new(provider.tracer("club-tracker")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(use_ansi(config))
                .with_writer(std::io::stderr),
        )
        .with(otel_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(OtelGuard { tracer_provider })
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("Failed to shut down tracer provider: {:?}", err);
            }
        }
    }
}
