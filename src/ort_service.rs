use crate::{
    config::ModelSettings,
    model_service::{ModelError, ModelService},
};
use ndarray::ArrayView2;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// ONNX Runtime backend over the exported classifier. Sessions require
/// exclusive access to run, so a small pool is kept and handed out
/// round-robin.
#[derive(Clone)]
pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
}

impl OrtModelService {
    pub fn new(model_config: &ModelSettings) -> Result<Self, Box<dyn std::error::Error>> {
        ort::init().commit()?;

        let num_instances = model_config.num_instances.max(1);
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(model_config.get_classifier_path())?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        tracing::info!("Created {} ONNX sessions", num_instances);

        Ok(Self {
            sessions: Arc::new(sessions),
            counter: Arc::new(AtomicUsize::new(0)),
        })
    }
}

impl ModelService for OrtModelService {
    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<i64, ModelError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let session_arc = &self.sessions[index];
        let mut session = session_arc
            .lock()
            .map_err(|e| ModelError::Session(format!("session mutex poisoned: {}", e)))?;

        tracing::debug!("Handling request with session {}", index);
        let owned_buffer;
        let input_view = if features.is_standard_layout() {
            features
        } else {
            owned_buffer = features.to_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| ModelError::Inference(format!("failed to build tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| ModelError::Inference(format!("inference failed: {}", e)))?;

        // The exported pipeline emits the class label tensor first.
        let (_, labels) = outputs[0]
            .try_extract_tensor::<i64>()
            .map_err(|e| ModelError::Inference(format!("failed to extract labels: {}", e)))?;

        labels.first().copied().ok_or(ModelError::EmptyOutput)
    }
}
