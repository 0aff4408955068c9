//! Feature extraction for resale price model inference.
//!
//! Builds the model input row from a prediction request. The column order
//! must match the order used when the model was trained; reordering silently
//! corrupts every prediction without raising an error.

use crate::encoder::{CategoricalField, CategoryEncoder, UnknownLabelPolicy};
use crate::error::Result;
use crate::types::request::PredictionRequest;

/// Number of model input features.
pub const FEATURE_COUNT: usize = 10;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "year",
    "town",
    "flat_type",
    "floor_area_sqm",
    "flat_model",
    "storey_start_log",
    "storey_end_log",
    "remaining_lease_year",
    "remaining_lease_month",
    "lease_commence_date",
];

/// `ln(x + 1)`, applied to the storey range bounds.
pub fn log_transform(x: f64) -> f64 {
    (x + 1.0).ln()
}

/// One model input row, in [`FEATURE_NAMES`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap raw values that are already in model input order.
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Values in model input order
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value of the named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.0[i])
    }

    /// First NaN or infinite element as `(index, value)`.
    pub fn first_non_finite(&self) -> Option<(usize, f64)> {
        self.0
            .iter()
            .copied()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
    }

    /// Values narrowed to the `f32` precision ONNX models take as input.
    pub fn to_f32(&self) -> Vec<f32> {
        self.0.iter().map(|&v| v as f32).collect()
    }
}

/// Feature extractor that turns prediction requests into model input rows.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    encoder: CategoryEncoder,
}

impl FeatureExtractor {
    /// Create a new feature extractor with the given unknown-label policy.
    pub fn new(policy: UnknownLabelPolicy) -> Self {
        Self {
            encoder: CategoryEncoder::new(policy),
        }
    }

    /// Build the feature vector for a request.
    ///
    /// Categorical labels are encoded, the storey bounds go through
    /// [`log_transform`], and every other field passes through unchanged.
    /// Fails only when the reject policy meets an unknown label; finiteness
    /// is checked by the predictor.
    pub fn extract(&self, req: &PredictionRequest) -> Result<FeatureVector> {
        let town = self.encoder.encode(CategoricalField::Town, &req.town)?;
        let flat_type = self.encoder.encode(CategoricalField::FlatType, &req.flat_type)?;
        let flat_model = self
            .encoder
            .encode(CategoricalField::FlatModel, &req.flat_model)?;

        Ok(FeatureVector([
            req.year as f64,
            town as f64,
            flat_type as f64,
            req.floor_area_sqm,
            flat_model as f64,
            log_transform(req.storey_start),
            log_transform(req.storey_end),
            req.remaining_lease_year as f64,
            req.remaining_lease_month as f64,
            req.lease_commence_date as f64,
        ]))
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names in model input order.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictError;

    fn bishan() -> PredictionRequest {
        PredictionRequest::new(2021, "BISHAN", "4 ROOM", "Model A")
            .with_floor_area(90.0)
            .with_storeys(5.0, 7.0)
            .with_lease(60, 3, 1995)
    }

    #[test]
    fn test_feature_order() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract(&bishan()).unwrap();

        let expected = [
            2021.0,
            2.0,
            3.0,
            90.0,
            8.0,
            6.0f64.ln(),
            8.0f64.ln(),
            60.0,
            3.0,
            1995.0,
        ];
        assert_eq!(features.as_slice(), &expected);
        assert_eq!(features.get("flat_model"), Some(8.0));
        assert_eq!(features.get("lease_commence_date"), Some(1995.0));
        assert_eq!(features.get("price"), None);
    }

    #[test]
    fn test_feature_count() {
        let extractor = FeatureExtractor::default();
        assert_eq!(extractor.feature_count(), 10);
        assert_eq!(extractor.feature_names().len(), extractor.feature_count());
    }

    #[test]
    fn test_log_transform() {
        assert_eq!(log_transform(0.0), 0.0);
        assert!((log_transform(std::f64::consts::E - 1.0) - 1.0).abs() < 1e-12);

        let mut prev = log_transform(0.0);
        for storey in 1..=51 {
            let next = log_transform(storey as f64);
            assert!(next > prev);
            assert!(next > 0.0);
            prev = next;
        }
    }

    #[test]
    fn test_unknown_label_sentinel() {
        let extractor = FeatureExtractor::default();
        let mut req = bishan();
        req.town = "ATLANTIS".to_string();

        let features = extractor.extract(&req).unwrap();
        assert_eq!(features.get("town"), Some(-1.0));
        assert_eq!(features.first_non_finite(), None);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let extractor = FeatureExtractor::new(UnknownLabelPolicy::Reject);
        let mut req = bishan();
        req.flat_type = "PENTHOUSE".to_string();

        assert!(matches!(
            extractor.extract(&req),
            Err(PredictError::UnknownLabel { field: "flat_type", .. })
        ));
    }

    #[test]
    fn test_non_finite_detection() {
        let extractor = FeatureExtractor::default();
        let req = bishan().with_storeys(-1.0, 7.0);

        let features = extractor.extract(&req).unwrap();
        let (index, value) = features.first_non_finite().unwrap();
        assert_eq!(FEATURE_NAMES[index], "storey_start_log");
        assert_eq!(value, f64::NEG_INFINITY);
    }

    #[test]
    fn test_to_f32() {
        let features = FeatureExtractor::default().extract(&bishan()).unwrap();
        let narrowed = features.to_f32();
        assert_eq!(narrowed.len(), FEATURE_COUNT);
        assert_eq!(narrowed[0], 2021.0f32);
        assert_eq!(narrowed[3], 90.0f32);
    }
}
