//! Prediction reply sent back to the front-end

use crate::error::PredictError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Error details carried in a failed reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind (see [`PredictError::kind`])
    pub kind: String,
    /// Message suitable for display to the user
    pub message: String,
}

/// Reply to a [`PredictionRequest`](crate::types::PredictionRequest)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Correlation identifier copied from the request
    pub request_id: String,

    /// Whether a price was produced
    pub status: ResponseStatus,

    /// Estimated resale price, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,

    /// Failure details, present on error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,

    /// Reply generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl PredictionResponse {
    /// Successful reply carrying a price
    pub fn success(request_id: String, price: i64) -> Self {
        Self {
            request_id,
            status: ResponseStatus::Ok,
            price: Some(price),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Failed reply carrying the error
    pub fn failure(request_id: String, error: &PredictError) -> Self {
        Self {
            request_id,
            status: ResponseStatus::Error,
            price: None,
            error: Some(ErrorBody {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
            timestamp: Utc::now(),
        }
    }

    /// Build a reply from a prediction outcome
    pub fn from_result(request_id: String, result: &Result<i64, PredictError>) -> Self {
        match result {
            Ok(price) => Self::success(request_id, *price),
            Err(e) => Self::failure(request_id, e),
        }
    }

    /// Whether the reply carries a price
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}
