//! Regression model loading, ownership and inference

pub mod handle;
pub mod loader;
pub mod predictor;
pub mod regressor;

pub use handle::ModelHandle;
pub use loader::ModelLoader;
pub use predictor::{price_from_log, Predictor};
pub use regressor::{OnnxRegressor, Regressor};
