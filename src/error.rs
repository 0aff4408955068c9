//! Error types for price prediction

use thiserror::Error;

/// Errors surfaced to the caller of a prediction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// A categorical label has no code (only raised under the reject policy).
    #[error("unknown {field} label: {label:?}")]
    UnknownLabel {
        /// Request field the label came from.
        field: &'static str,
        /// The label as submitted.
        label: String,
    },

    /// The assembled feature vector contains NaN or an infinity.
    #[error("input data contains invalid or infinite values: {name} (feature {index}) = {value}")]
    NonFiniteFeature {
        /// Position in the feature vector.
        index: usize,
        /// Feature name at that position.
        name: &'static str,
        /// The offending value.
        value: f64,
    },

    /// The model artifact is missing or could not be loaded.
    #[error("error loading model: {0}")]
    ModelLoad(String),

    /// The runtime failed while executing the model.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model produced a value that does not map to a finite price.
    #[error("model output does not map to a finite price: {0}")]
    InvalidModelOutput(f64),

    /// A numeric field could not be parsed, or the request payload was malformed.
    #[error("invalid request: {0}")]
    Parse(String),
}

impl PredictError {
    /// Stable identifier for the error kind, carried in error replies and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::UnknownLabel { .. } => "unknown_label",
            PredictError::NonFiniteFeature { .. } => "non_finite_feature",
            PredictError::ModelLoad(_) => "model_load",
            PredictError::Inference(_) => "inference",
            PredictError::InvalidModelOutput(_) => "invalid_model_output",
            PredictError::Parse(_) => "parse",
        }
    }
}

/// Result alias for prediction operations.
pub type Result<T> = std::result::Result<T, PredictError>;
