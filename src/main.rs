//! Resale Price Predictor - Main Entry Point
//!
//! Answers resale price prediction requests received over NATS.
//! Requests are processed in parallel up to the configured worker count.

use anyhow::{Context, Result};
use futures::StreamExt;
use resale_price_predictor::{
    config::{AppConfig, LogFormat, LoggingConfig},
    metrics::{MetricsReporter, PipelineMetrics},
    models::Predictor,
    producer::ResponseProducer,
    service::{failure_kind, handle_payload, WorkerPool},
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("resale_price_predictor={}", logging.level)))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Resale Price Predictor");
    info!(
        model_path = %config.models.model_path,
        preload = config.models.preload,
        unknown_labels = ?config.encoding.unknown_labels,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    let predictor = Arc::new(Predictor::from_config(&config)?);
    info!(
        features = predictor.extractor().feature_count(),
        model_loaded = predictor.model().is_loaded(),
        "Predictor initialized"
    );

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let producer = Arc::new(ResponseProducer::new(client.clone(), &config.nats.response_subject));

    // Limits concurrent processing
    let workers = WorkerPool::new(config.pipeline.workers);
    info!(
        workers = workers.size(),
        request_subject = %config.nats.request_subject,
        fallback_reply_subject = %producer.fallback_subject(),
        "Starting request processing loop"
    );

    let processed_count = Arc::new(AtomicU64::new(0));

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let mut subscription = client
        .subscribe(config.nats.request_subject.clone())
        .await
        .with_context(|| format!("Failed to subscribe to {}", config.nats.request_subject))?;
    info!(subject = %config.nats.request_subject, "Subscribed to request subject");

    loop {
        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        };

        // Acquire permit (limits concurrent tasks)
        let permit = workers.acquire().await.context("Worker pool closed")?;

        let predictor = predictor.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            // Inference is synchronous; keep it off the async workers
            let payload = message.payload.clone();
            let task = tokio::task::spawn_blocking(move || handle_payload(&predictor, &payload));
            let response = match task.await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "Prediction task panicked");
                    drop(permit);
                    return;
                }
            };

            let processing_time = start_time.elapsed();
            match (response.price, failure_kind(&response)) {
                (Some(price), _) => metrics.record_prediction(processing_time, price),
                (None, kind) => metrics.record_failure(processing_time, kind.unwrap_or("unknown")),
            }

            if let Err(e) = producer.publish(message.reply.as_ref(), &response).await {
                error!(
                    request_id = %response.request_id,
                    error = %e,
                    "Failed to publish prediction reply"
                );
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let processing_stats = metrics.get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} req/s", metrics.get_throughput()),
                    avg_latency_us = processing_stats.mean_us,
                    "Processing milestone"
                );
            }

            // Release permit when done
            drop(permit);
        });
    }

    // Stop taking requests, then let in-flight ones reply before exiting
    drop(subscription);
    info!("Predictor shutting down, waiting for in-flight requests...");
    let _idle = workers.drain().await.context("Worker pool closed")?;
    if let Err(e) = client.flush().await {
        error!(error = %e, "Failed to flush pending replies");
    }
    metrics.print_summary();

    Ok(())
}
