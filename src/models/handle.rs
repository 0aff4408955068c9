//! Lazily loaded, process-lifetime model ownership

use crate::error::{PredictError, Result};
use crate::models::loader::ModelLoader;
use crate::models::regressor::Regressor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

type LoadFn = dyn Fn() -> Result<Arc<dyn Regressor>> + Send + Sync;

/// Owns the regression model.
///
/// The model is loaded on first use and kept until the handle is dropped.
/// A failed load is not cached, so the next request tries again.
pub struct ModelHandle {
    source: String,
    load: Box<LoadFn>,
    model: Mutex<Option<Arc<dyn Regressor>>>,
}

impl ModelHandle {
    /// Handle that loads an ONNX model from `path` on first use.
    pub fn onnx(path: impl Into<PathBuf>, onnx_threads: usize) -> Self {
        let path = path.into();
        let source = path.display().to_string();
        let loader = ModelLoader::with_threads(onnx_threads);

        Self::lazy(source, move || {
            let model = loader.load_model(&path)?;
            Ok(Arc::new(model) as Arc<dyn Regressor>)
        })
    }

    /// Handle that runs `load` on first use.
    pub fn lazy<F>(source: impl Into<String>, load: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Regressor>> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            load: Box::new(load),
            model: Mutex::new(None),
        }
    }

    /// Handle around an already loaded model.
    pub fn ready<R: Regressor + 'static>(model: Arc<R>) -> Self {
        let name = model.name().to_string();
        let model: Arc<dyn Regressor> = model;
        let fallback = model.clone();

        Self {
            source: name,
            load: Box::new(move || Ok(fallback.clone())),
            model: Mutex::new(Some(model)),
        }
    }

    /// Where the model comes from (path or name)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the model has been loaded
    pub fn is_loaded(&self) -> bool {
        self.model.lock().map(|m| m.is_some()).unwrap_or(false)
    }

    /// Load the model now if it is not loaded yet.
    pub fn preload(&self) -> Result<()> {
        self.acquire().map(|_| ())
    }

    /// Run `f` against the model, loading it first if needed.
    pub fn with_model<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Regressor) -> Result<T>,
    {
        let model = self.acquire()?;
        f(model.as_ref())
    }

    fn acquire(&self) -> Result<Arc<dyn Regressor>> {
        let mut slot = self
            .model
            .lock()
            .map_err(|e| PredictError::ModelLoad(format!("lock error: {e}")))?;

        if let Some(model) = slot.as_ref() {
            return Ok(model.clone());
        }

        let model = (self.load)()?;
        info!(source = %self.source, model = %model.name(), "Model ready");
        *slot = Some(model.clone());
        Ok(model)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("source", &self.source)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::FeatureVector;
    use crate::models::regressor::testing::StubRegressor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_loads_once_on_first_use() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let handle = ModelHandle::lazy("stub", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubRegressor::returning(12.0)) as Arc<dyn Regressor>)
        });

        assert!(!handle.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        let row = FeatureVector::new([0.0; 10]);
        for _ in 0..3 {
            let y = handle.with_model(|m| m.predict(&row)).unwrap();
            assert_eq!(y, 12.0);
        }

        assert!(handle.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let handle = ModelHandle::lazy("flaky", move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(PredictError::ModelLoad("not yet".to_string()))
            } else {
                Ok(Arc::new(StubRegressor::returning(1.0)) as Arc<dyn Regressor>)
            }
        });

        assert!(matches!(handle.preload(), Err(PredictError::ModelLoad(_))));
        assert!(!handle.is_loaded());
        assert!(handle.preload().is_ok());
        assert!(handle.is_loaded());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ready_handle() {
        let stub = Arc::new(StubRegressor::returning(3.0));
        let handle = ModelHandle::ready(stub.clone());

        assert!(handle.is_loaded());
        assert_eq!(handle.source(), "stub");
        let row = FeatureVector::new([1.0; 10]);
        assert_eq!(handle.with_model(|m| m.predict(&row)).unwrap(), 3.0);
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn test_missing_onnx_file() {
        let handle = ModelHandle::onnx("models/definitely_missing.onnx", 1);
        let err = handle.preload().unwrap_err();
        assert_eq!(err.kind(), "model_load");
        assert!(!handle.is_loaded());
    }
}
