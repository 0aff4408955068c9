//! NATS message producer for prediction replies

use crate::types::response::PredictionResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Producer for publishing prediction replies to NATS
#[derive(Clone)]
pub struct ResponseProducer {
    client: Client,
    fallback_subject: String,
}

impl ResponseProducer {
    /// Create a new response producer. Replies to requests that carry no
    /// reply subject go to `fallback_subject`.
    pub fn new(client: Client, fallback_subject: &str) -> Self {
        Self {
            client,
            fallback_subject: fallback_subject.to_string(),
        }
    }

    /// Publish a reply, to the request's reply subject when it has one
    pub async fn publish(&self, reply_to: Option<&Subject>, response: &PredictionResponse) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        let subject = reply_subject(reply_to, &self.fallback_subject);

        self.client.publish(subject.clone(), payload.into()).await?;

        debug!(
            request_id = %response.request_id,
            subject = %subject,
            status = ?response.status,
            price = ?response.price,
            "Published prediction reply"
        );

        Ok(())
    }

    /// Get the fallback subject name
    pub fn fallback_subject(&self) -> &str {
        &self.fallback_subject
    }
}

fn reply_subject(reply_to: Option<&Subject>, fallback: &str) -> String {
    reply_to
        .map(|s| s.to_string())
        .unwrap_or_else(|| fallback.to_string())
}
