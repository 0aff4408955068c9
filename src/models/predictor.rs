//! Resale price prediction: encode, transform, infer, decode

use crate::config::AppConfig;
use crate::error::{PredictError, Result};
use crate::feature_extractor::{FeatureExtractor, FeatureVector, FEATURE_NAMES};
use crate::models::handle::ModelHandle;
use crate::types::request::PredictionRequest;
use tracing::{debug, warn};

/// Turns prediction requests into price estimates.
#[derive(Debug)]
pub struct Predictor {
    extractor: FeatureExtractor,
    model: ModelHandle,
}

impl Predictor {
    /// Create a predictor from its parts
    pub fn new(extractor: FeatureExtractor, model: ModelHandle) -> Self {
        Self { extractor, model }
    }

    /// Create a predictor from configuration. The model is not loaded until
    /// the first prediction unless `models.preload` is set.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let predictor = Self::new(
            FeatureExtractor::new(config.encoding.unknown_labels),
            ModelHandle::onnx(&config.models.model_path, config.models.onnx_threads),
        );

        if config.models.preload {
            predictor.model.preload()?;
        }

        Ok(predictor)
    }

    /// The feature extractor in use
    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// The model handle in use
    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Predict the resale price for a request.
    pub fn predict(&self, req: &PredictionRequest) -> Result<i64> {
        let features = self.extractor.extract(req)?;
        debug!(
            request_id = %req.request_id,
            features = ?features.as_slice(),
            "Features extracted"
        );
        self.predict_features(&features)
    }

    /// Predict the resale price for an already assembled feature row.
    ///
    /// Rejects rows with NaN or infinite values without invoking the model.
    pub fn predict_features(&self, features: &FeatureVector) -> Result<i64> {
        if let Some((index, value)) = features.first_non_finite() {
            warn!(
                feature = FEATURE_NAMES[index],
                value = value,
                "Rejecting non-finite feature vector"
            );
            return Err(PredictError::NonFiniteFeature {
                index,
                name: FEATURE_NAMES[index],
                value,
            });
        }

        let y = self.model.with_model(|model| model.predict(features))?;
        price_from_log(y)
    }
}

/// Reverse the log transform on the target: `round(exp(y))`, halves to even.
pub fn price_from_log(y: f64) -> Result<i64> {
    let price = y.exp();
    if !price.is_finite() || price >= i64::MAX as f64 {
        return Err(PredictError::InvalidModelOutput(y));
    }
    Ok(price.round_ties_even() as i64)
}
