//! Prediction request submitted by a front-end

use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};

/// One resale flat to price.
///
/// Numeric fields accept JSON numbers or numeric strings, since form
/// front-ends commonly submit selector values (such as the year) as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Correlation identifier, generated when the caller omits it
    #[serde(default = "new_request_id")]
    pub request_id: String,

    /// Year of sale (2015 - 2024)
    #[serde(deserialize_with = "lenient::int")]
    pub year: i32,

    /// Town label, e.g. "BISHAN"
    pub town: String,

    /// Flat type label, e.g. "4 ROOM"
    pub flat_type: String,

    /// Floor area in square metres (31 - 280)
    #[serde(deserialize_with = "lenient::float")]
    pub floor_area_sqm: f64,

    /// Flat model label, e.g. "Model A"
    pub flat_model: String,

    /// Lowest storey of the storey range (1 - 51)
    #[serde(deserialize_with = "lenient::float")]
    pub storey_start: f64,

    /// Highest storey of the storey range (1 - 51)
    #[serde(deserialize_with = "lenient::float")]
    pub storey_end: f64,

    /// Whole years left on the lease (1 - 99)
    #[serde(deserialize_with = "lenient::int")]
    pub remaining_lease_year: i32,

    /// Months left on the lease beyond the whole years (1 - 12)
    #[serde(deserialize_with = "lenient::int")]
    pub remaining_lease_month: i32,

    /// Year the lease commenced (1966 - 2023)
    #[serde(deserialize_with = "lenient::int")]
    pub lease_commence_date: i32,
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl PredictionRequest {
    /// Create a request for the given year and labels. Numeric attributes
    /// start at the low end of their ranges; set them with the `with_*` methods.
    pub fn new(year: i32, town: &str, flat_type: &str, flat_model: &str) -> Self {
        Self {
            request_id: new_request_id(),
            year,
            town: town.to_string(),
            flat_type: flat_type.to_string(),
            floor_area_sqm: 31.0,
            flat_model: flat_model.to_string(),
            storey_start: 1.0,
            storey_end: 1.0,
            remaining_lease_year: 1,
            remaining_lease_month: 1,
            lease_commence_date: 1966,
        }
    }

    /// Set the floor area
    pub fn with_floor_area(mut self, floor_area_sqm: f64) -> Self {
        self.floor_area_sqm = floor_area_sqm;
        self
    }

    /// Set the storey range
    pub fn with_storeys(mut self, storey_start: f64, storey_end: f64) -> Self {
        self.storey_start = storey_start;
        self.storey_end = storey_end;
        self
    }

    /// Set the lease attributes
    pub fn with_lease(
        mut self,
        remaining_lease_year: i32,
        remaining_lease_month: i32,
        lease_commence_date: i32,
    ) -> Self {
        self.remaining_lease_year = remaining_lease_year;
        self.remaining_lease_month = remaining_lease_month;
        self.lease_commence_date = lease_commence_date;
        self
    }

    /// Set the correlation identifier
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Decode a request from a JSON payload.
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|e| PredictError::Parse(e.to_string()))
    }
}

/// Deserializers that accept numbers or numeric strings.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub(super) fn int<'de, D>(deserializer: D) -> Result<i32, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Int(v) => i32::try_from(v)
                .map_err(|_| D::Error::custom(format!("integer out of range: {v}"))),
            NumberOrText::Float(v)
                if v.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(&v) =>
            {
                Ok(v as i32)
            }
            NumberOrText::Float(v) => {
                Err(D::Error::custom(format!("expected an integer, got {v}")))
            }
            NumberOrText::Text(s) => s
                .trim()
                .parse::<i32>()
                .map_err(|e| D::Error::custom(format!("invalid integer {s:?}: {e}"))),
        }
    }

    pub(super) fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Int(v) => Ok(v as f64),
            NumberOrText::Float(v) => Ok(v),
            NumberOrText::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| D::Error::custom(format!("invalid number {s:?}: {e}"))),
        }
    }
}
