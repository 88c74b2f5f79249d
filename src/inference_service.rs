use crate::{
    features::FeatureExtractor,
    model_service::{ModelError, ModelService},
    preprocess::Preprocessor,
    scaler::{Scaler, ScalerError},
};
use image::imageops::FilterType;
use ndarray::{Array2, Axis};
use thiserror::Error;

/// Canonical spatial size every upload is resized to before feature
/// extraction; the persisted artifacts were fit at this size.
pub const IMG_SIZE: u32 = 128;

pub const CLASS_LABELS: [&str; 4] = ["glioma", "meningioma", "no tumor", "pituitary"];

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Invalid image file!")]
    InvalidImage(#[source] image::ImageError),
    #[error("model artifacts are not loaded")]
    ModelUnavailable,
    #[error(transparent)]
    Scaler(#[from] ScalerError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("model predicted unknown class {0}")]
    UnknownClass(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub label: String,
    pub class_index: i64,
}

/// Runs the full decode -> resize -> preprocess -> extract -> scale ->
/// classify pipeline. Holds only read-only state and is shared across
/// requests. Model and scaler are optional so a failed artifact load at
/// startup degrades to per-request errors instead of refusing to boot.
pub struct InferenceService<M: ModelService> {
    preprocessor: Preprocessor,
    extractor: FeatureExtractor,
    model: Option<M>,
    scaler: Option<Scaler>,
}

impl<M: ModelService> InferenceService<M> {
    pub fn new(model: Option<M>, scaler: Option<Scaler>) -> Self {
        Self {
            preprocessor: Preprocessor::default(),
            extractor: FeatureExtractor::new(),
            model,
            scaler,
        }
    }

    pub fn predict(&self, image_data: &[u8]) -> Result<Prediction, InferenceError> {
        let (model, scaler) = match (&self.model, &self.scaler) {
            (Some(model), Some(scaler)) => (model, scaler),
            _ => return Err(InferenceError::ModelUnavailable),
        };

        let img = image::load_from_memory(image_data).map_err(InferenceError::InvalidImage)?;
        let resized = img.resize_exact(IMG_SIZE, IMG_SIZE, FilterType::Triangle);

        let enhanced = self.preprocessor.process(&resized);
        let features = self.extractor.extract_all(&enhanced);
        let scaled = scaler.transform(&features)?;

        let row: Array2<f32> = scaled.mapv(|v| v as f32).insert_axis(Axis(0));
        let class_index = model.predict(row.view())?;

        let label = usize::try_from(class_index)
            .ok()
            .and_then(|idx| CLASS_LABELS.get(idx))
            .ok_or(InferenceError::UnknownClass(class_index))?;

        tracing::debug!(class_index, label = %label, "classified upload");

        Ok(Prediction {
            label: (*label).to_string(),
            class_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use ndarray::ArrayView2;
    use std::io::Cursor;

    #[derive(Clone)]
    struct MockModelService {
        class_index: i64,
    }

    impl ModelService for MockModelService {
        fn predict(&self, features: ArrayView2<'_, f32>) -> Result<i64, ModelError> {
            assert_eq!(features.nrows(), 1);
            Ok(self.class_index)
        }
    }

    fn identity_scaler() -> Scaler {
        let len = FeatureExtractor::new().feature_len(IMG_SIZE as usize, IMG_SIZE as usize);
        Scaler::new(vec![0.0; len], vec![1.0; len]).unwrap()
    }

    fn png_image(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut image_data: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut image_data);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        image_data
    }

    #[test]
    fn test_predict_maps_class_index_to_label() {
        let service = InferenceService::new(
            Some(MockModelService { class_index: 2 }),
            Some(identity_scaler()),
        );

        let prediction = service.predict(&png_image(100, 100)).unwrap();

        assert_eq!(prediction.class_index, 2);
        assert_eq!(prediction.label, "no tumor");
    }

    #[test]
    fn test_predict_is_deterministic_for_identical_bytes() {
        let service = InferenceService::new(
            Some(MockModelService { class_index: 0 }),
            Some(identity_scaler()),
        );
        let image_data = png_image(200, 150);

        let first = service.predict(&image_data).unwrap();
        let second = service.predict(&image_data).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_predict_rejects_undecodable_bytes() {
        let service = InferenceService::new(
            Some(MockModelService { class_index: 0 }),
            Some(identity_scaler()),
        );

        let result = service.predict(&[0u8, 1, 2, 3]);

        assert!(matches!(result, Err(InferenceError::InvalidImage(_))));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invalid image file!".to_string()
        );
    }

    #[test]
    fn test_predict_fails_without_artifacts() {
        let service: InferenceService<MockModelService> = InferenceService::new(None, None);

        let result = service.predict(&png_image(100, 100));

        assert!(matches!(result, Err(InferenceError::ModelUnavailable)));
    }

    #[test]
    fn test_predict_rejects_unknown_class() {
        let service = InferenceService::new(
            Some(MockModelService { class_index: 7 }),
            Some(identity_scaler()),
        );

        let result = service.predict(&png_image(100, 100));

        assert!(matches!(result, Err(InferenceError::UnknownClass(7))));
    }

    #[test]
    fn test_predict_surfaces_feature_length_mismatch() {
        let service = InferenceService::new(
            Some(MockModelService { class_index: 0 }),
            Some(Scaler::new(vec![0.0; 10], vec![1.0; 10]).unwrap()),
        );

        let result = service.predict(&png_image(100, 100));

        assert!(matches!(
            result,
            Err(InferenceError::Scaler(ScalerError::LengthMismatch { .. }))
        ));
    }
}
