//! ONNX model loader

use crate::error::{PredictError, Result};
use crate::models::regressor::OnnxRegressor;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loader for ONNX regression models
#[derive(Debug, Clone)]
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load a regression model from file.
    ///
    /// A missing or unreadable artifact is reported as [`PredictError::ModelLoad`].
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<OnnxRegressor> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        if !path.is_file() {
            return Err(PredictError::ModelLoad(format!(
                "model artifact not found at {}",
                path.display()
            )));
        }

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let load_err = |e: &dyn std::fmt::Display| {
            PredictError::ModelLoad(format!("failed to load model from {}: {}", path.display(), e))
        };

        let session = Session::builder()
            .map_err(|e| load_err(&e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_err(&e))?
            .with_intra_threads(self.onnx_threads)
            .map_err(|e| load_err(&e))?
            .commit_from_file(path)
            .map_err(|e| load_err(&e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| load_err(&"model declares no inputs"))?;

        // skl2onnx names the regression output "variable"
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == "variable" || o.name.contains("predict") || o.name.contains("output"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .ok_or_else(|| load_err(&"model declares no outputs"))?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(OnnxRegressor::new(name, session, input_name, output_name))
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}
