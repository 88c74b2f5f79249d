use ndarray::ArrayView2;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model session unavailable: {0}")]
    Session(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model returned no prediction")]
    EmptyOutput,
}

/// Seam between the inference pipeline and the classifier backend. Takes a
/// single-row feature matrix and returns the predicted class index.
pub trait ModelService: Send + Sync + Clone + 'static {
    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<i64, ModelError>;
}
