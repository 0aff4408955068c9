//! Resale Flat Price Predictor Library
//!
//! Predicts Singapore HDB resale flat prices with a pre-trained ONNX
//! regression model. Requests arrive over NATS; each is encoded into the
//! model's fixed feature layout, scored, and answered with a price.

pub mod config;
pub mod encoder;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod service;
pub mod types;

pub use config::AppConfig;
pub use encoder::{CategoryEncoder, UnknownLabelPolicy};
pub use error::PredictError;
pub use feature_extractor::{FeatureExtractor, FeatureVector};
pub use models::{ModelHandle, Predictor, Regressor};
pub use producer::ResponseProducer;
pub use service::WorkerPool;
pub use types::{PredictionRequest, PredictionResponse};
