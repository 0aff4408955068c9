//! Regression model interface and its ONNX Runtime implementation

use crate::error::{PredictError, Result};
use crate::feature_extractor::FeatureVector;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

/// A trained regression model that maps one feature row to one scalar.
///
/// The model was trained on a log-transformed price, so the scalar is
/// `ln(price)`; callers reverse the transform.
pub trait Regressor: Send + Sync {
    /// Predict the target for a single feature row.
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Model name for logging
    fn name(&self) -> &str;
}

/// Regression model loaded into an ONNX Runtime session
pub struct OnnxRegressor {
    /// Model name
    pub name: String,
    /// ONNX Runtime session; `run` needs exclusive access
    session: Mutex<Session>,
    /// Input name for the feature row
    pub input_name: String,
    /// Output name for the prediction
    pub output_name: String,
}

impl OnnxRegressor {
    pub(crate) fn new(
        name: String,
        session: Session,
        input_name: String,
        output_name: String,
    ) -> Self {
        Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
        }
    }
}

impl std::fmt::Debug for OnnxRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxRegressor")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let row = features.to_f32();

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor = Tensor::from_array((shape, row))
            .map_err(|e| PredictError::Inference(format!("failed to create input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| PredictError::Inference(format!("lock error: {e}")))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| PredictError::Inference(e.to_string()))?;

        let output = outputs.get(&self.output_name).ok_or_else(|| {
            PredictError::Inference(format!("model has no output named {}", self.output_name))
        })?;

        // skl2onnx regressors emit float tensors; models exported in double precision emit f64
        let y = if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            data.first().map(|&v| v as f64)
        } else if let Ok((_, data)) = output.try_extract_tensor::<f64>() {
            data.first().copied()
        } else {
            return Err(PredictError::Inference(format!(
                "output {} is not a float tensor",
                self.output_name
            )));
        };

        let y = y.ok_or_else(|| {
            PredictError::Inference("model returned an empty tensor".to_string())
        })?;
        debug!(model = %self.name, y = y, "Model inference complete");
        Ok(y)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Regressor returning a fixed output and recording what it was given.
    #[derive(Debug, Default)]
    pub(crate) struct StubRegressor {
        output: f64,
        calls: AtomicUsize,
        last_input: Mutex<Option<FeatureVector>>,
    }

    impl StubRegressor {
        pub(crate) fn returning(output: f64) -> Self {
            Self {
                output,
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn last_input(&self) -> Option<FeatureVector> {
            *self.last_input.lock().unwrap()
        }
    }

    impl Regressor for StubRegressor {
        fn predict(&self, features: &FeatureVector) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock().unwrap() = Some(*features);
            Ok(self.output)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Regressor whose runtime always fails.
    #[derive(Debug)]
    pub(crate) struct FailingRegressor;

    impl Regressor for FailingRegressor {
        fn predict(&self, _features: &FeatureVector) -> Result<f64> {
            Err(PredictError::Inference("session crashed".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }
}
