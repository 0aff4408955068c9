//! Type definitions for the resale price predictor

pub mod request;
pub mod response;

pub use request::PredictionRequest;
pub use response::{PredictionResponse, ResponseStatus};
