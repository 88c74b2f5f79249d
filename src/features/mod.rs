mod glcm;
mod hog;
mod lbp;

use hog::HogParams;
use ndarray::{Array1, Array2};

/// Computes the handcrafted texture descriptors and concatenates them into a
/// single vector, in fixed order: co-occurrence statistics, LBP histogram,
/// HOG descriptor. The order and every parameter are a contract with the
/// persisted scaler and classifier and must not change independently.
pub struct FeatureExtractor {
    lbp_points: usize,
    lbp_radius: f64,
    hog: HogParams,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            lbp_points: 24,
            lbp_radius: 3.0,
            hog: HogParams::default(),
        }
    }

    /// Total feature count for an image of the given dimensions.
    pub fn feature_len(&self, height: usize, width: usize) -> usize {
        4 + self.lbp_points + 2 + self.hog.descriptor_len(height, width)
    }

    pub fn extract_all(&self, img: &Array2<u8>) -> Array1<f64> {
        let view = img.view();
        let (height, width) = img.dim();

        let mut features = Vec::with_capacity(self.feature_len(height, width));
        features.extend_from_slice(&glcm::glcm_features(view));
        features.extend(lbp::lbp_histogram(view, self.lbp_points, self.lbp_radius));
        features.extend(hog::hog_descriptor(view, &self.hog));

        Array1::from_vec(features)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_extract_all_has_expected_length() {
        let extractor = FeatureExtractor::new();
        let img = Array2::from_shape_fn((128, 128), |(r, c)| ((r * 11 + c * 3) % 256) as u8);

        let features = extractor.extract_all(&img);

        assert_eq!(features.len(), 4 + 26 + 1764);
        assert_eq!(features.len(), extractor.feature_len(128, 128));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = FeatureExtractor::new();
        let img = Array2::from_shape_fn((128, 128), |(r, c)| ((r ^ c) % 256) as u8);

        let first = extractor.extract_all(&img);
        let second = extractor.extract_all(&img);

        assert_eq!(first, second);
    }

    #[test]
    fn test_descriptor_families_keep_their_positions() {
        let extractor = FeatureExtractor::new();
        let img = Array2::from_shape_fn((128, 128), |(r, c)| ((r * 7 + c) % 256) as u8);

        let features = extractor.extract_all(&img);

        // Co-occurrence block first, then the density-normalized histogram.
        assert!(features[0] >= 0.0);
        let lbp_sum: f64 = features.iter().skip(4).take(26).sum();
        assert!((lbp_sum - 1.0).abs() < 1e-9);
    }
}
