//! Conversion orchestrator entry point.

mod adapters;

use std::path::PathBuf;
use std::sync::Arc;

use bookvoice_config::Settings;
use bookvoice_core::CancellationToken;
use bookvoice_pipeline::Orchestrator;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Converts a book's plain-text manuscript into a set of chaptered audiobook files.
#[derive(Debug, Parser)]
#[command(name = "bookvoice", version, about)]
struct Cli {
    /// Plain-text manuscript to convert. Chapter boundaries are not auto-detected by this
    /// binary; the whole file is treated as a single "Chapter 1".
    input: PathBuf,

    /// Directory audio output, `_temp_work/`, and `pipeline_state.json` are written under.
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Selects `config/{env}.yaml` as an overlay on `config/default.yaml`.
    #[arg(long, env = "BOOKVOICE_ENV")]
    env: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match bookvoice_config::load_settings(cli.env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting bookvoice");
    tracing::info!(environment = ?config.environment, env = cli.env.as_deref().unwrap_or("default"), "configuration loaded");

    let _metrics_handle = init_metrics();
    tracing::info!("initialized prometheus metrics at /metrics (exporter wiring is the embedding binary's concern)");

    let text = tokio::fs::read_to_string(&cli.input).await?;
    tokio::fs::create_dir_all(&cli.output).await?;

    let orchestrator = Orchestrator::new(
        None,
        Arc::new(adapters::UnconfiguredTts),
        Arc::new(adapters::UnconfiguredEncoder),
        Some(Arc::new(adapters::NoopDictionary)),
        Arc::new(adapters::NoopKeepAwake),
        config,
        cli.output,
    );

    let cancellation = CancellationToken::new();
    let run_cancellation = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C, cancelling conversion");
            run_cancellation.cancel();
        }
    });

    let file_names = vec![("Chapter 1".to_string(), 0)];
    match orchestrator.run(text, file_names, cancellation).await {
        Ok(ctx) => {
            tracing::info!(
                saved_files = ctx.saved_file_count.unwrap_or(0),
                "conversion complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "conversion failed");
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}

#[cfg(feature = "telemetry")]
fn init_tracing(config: &Settings) {
    use opentelemetry_otlp::WithExportConfig;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bookvoice=info".into());
    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    if config.observability.metrics_enabled {
        if let Ok(tracer) = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .install_batch(opentelemetry_sdk::runtime::Tokio)
        {
            let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            subscriber.with(fmt_layer).with(otel_layer).init();
            return;
        }
    }
    subscriber.with(fmt_layer).init();
}

#[cfg(not(feature = "telemetry"))]
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bookvoice=info".into());
    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

fn init_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}
