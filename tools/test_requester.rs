//! Test Request Producer
//!
//! Generates prediction requests, sends them to the predictor over NATS
//! and logs each reply.

use anyhow::Context;
use rand::Rng;
use resale_price_predictor::encoder::{FLAT_MODELS, FLAT_TYPES, TOWNS};
use resale_price_predictor::types::{PredictionRequest, PredictionResponse};
use std::time::Duration;
use tracing::{info, warn};

/// Request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.request_counter += 1;
        format!("req_{:08}", self.request_counter)
    }

    /// Generate a request with every field inside its form range
    fn generate_valid(&mut self) -> PredictionRequest {
        let request_id = self.next_id();
        let town = self.random_label(&TOWNS);
        let flat_type = self.random_label(&FLAT_TYPES);
        let flat_model = self.random_label(&FLAT_MODELS);
        let storey_start = self.rng.gen_range(1..=49) as f64;
        let lease_commence_date = self.rng.gen_range(1966..=2023);

        PredictionRequest::new(self.rng.gen_range(2015..=2024), town, flat_type, flat_model)
            .with_request_id(request_id)
            .with_floor_area((self.rng.gen_range(31.0..=280.0_f64) * 10.0).round() / 10.0)
            .with_storeys(storey_start, storey_start + 2.0)
            .with_lease(
                self.rng.gen_range(1..=99),
                self.rng.gen_range(1..=12),
                lease_commence_date,
            )
    }

    /// Generate a request the predictor should refuse or flag
    fn generate_invalid(&mut self) -> PredictionRequest {
        let mut request = self.generate_valid();
        match self.rng.gen_range(0..3) {
            0 => request.town = "ATLANTIS".to_string(),
            1 => request.flat_model = "Igloo".to_string(),
            _ => request.storey_start = -1.0,
        }
        request
    }

    fn random_label(&mut self, table: &[(&'static str, i32)]) -> &'static str {
        table[self.rng.gen_range(0..table.len())].0
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_requester=info".parse()?),
        )
        .init();

    info!("Starting Test Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("resale.predict");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(20);
    let invalid_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        invalid_rate = invalid_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, invalid_rate, delay_ms).await;
        }
    };

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    let mut priced = 0;
    let mut failed = 0;

    for _ in 0..count {
        let request = if rng.gen_bool(invalid_rate) {
            generator.generate_invalid()
        } else {
            generator.generate_valid()
        };

        let payload = serde_json::to_vec(&request)?;
        let reply = client
            .request(subject.to_string(), payload.into())
            .await
            .with_context(|| format!("Request {} got no reply", request.request_id))?;
        let response: PredictionResponse =
            serde_json::from_slice(&reply.payload).context("Malformed prediction reply")?;

        match (response.price, response.error) {
            (Some(price), _) => {
                priced += 1;
                info!(
                    request_id = %response.request_id,
                    town = %request.town,
                    flat_type = %request.flat_type,
                    price = price,
                    "Estimated resale price: $ {}",
                    price
                );
            }
            (None, error) => {
                failed += 1;
                warn!(
                    request_id = %response.request_id,
                    error = ?error,
                    "Prediction failed"
                );
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} priced, {} failed)",
        count, priced, failed
    );

    Ok(())
}

async fn run_dry_mode(count: u64, invalid_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(invalid_rate) {
            generator.generate_invalid()
        } else {
            generator.generate_valid()
        };

        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
