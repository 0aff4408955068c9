//! Per-message request handling

use crate::models::predictor::Predictor;
use crate::types::request::PredictionRequest;
use crate::types::response::PredictionResponse;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore, SemaphorePermit};
use tracing::{info, warn};

/// Decode a request payload, predict, and build the reply.
///
/// Never fails: every error becomes an error reply for the caller to display.
pub fn handle_payload(predictor: &Predictor, payload: &[u8]) -> PredictionResponse {
    let request = match PredictionRequest::from_json(payload) {
        Ok(request) => request,
        Err(e) => {
            let request_id = salvage_request_id(payload);
            warn!(request_id = %request_id, error = %e, "Failed to decode prediction request");
            return PredictionResponse::failure(request_id, &e);
        }
    };

    let result = predictor.predict(&request);
    match &result {
        Ok(price) => info!(
            request_id = %request.request_id,
            town = %request.town,
            flat_type = %request.flat_type,
            price = *price,
            "Prediction served"
        ),
        Err(e) => warn!(
            request_id = %request.request_id,
            kind = e.kind(),
            error = %e,
            "Prediction failed"
        ),
    }

    PredictionResponse::from_result(request.request_id, &result)
}

/// Best-effort request id from a payload that failed to decode.
fn salvage_request_id(payload: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(payload)
        .ok()
        .and_then(|v| v.get("request_id").and_then(|id| id.as_str()).map(str::to_string))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Error kind of a reply, if it failed
pub fn failure_kind(response: &PredictionResponse) -> Option<&str> {
    response.error.as_ref().map(|e| e.kind.as_str())
}

/// Bounds how many requests are in flight at once.
///
/// Each in-flight request holds one permit until its reply is published.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    size: u32,
}

impl WorkerPool {
    /// Create a pool of `workers` permits (at least one).
    pub fn new(workers: usize) -> Self {
        let size = u32::try_from(workers.max(1)).unwrap_or(u32::MAX);
        Self {
            semaphore: Arc::new(Semaphore::new(size as usize)),
            size,
        }
    }

    /// Number of requests that may run concurrently
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Wait for a free worker
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.semaphore.clone().acquire_owned().await
    }

    /// Wait until every in-flight request has released its permit.
    ///
    /// The returned guard holds the whole pool, so nothing new starts while it lives.
    pub async fn drain(&self) -> Result<SemaphorePermit<'_>, AcquireError> {
        self.semaphore.acquire_many(self.size).await
    }
}
