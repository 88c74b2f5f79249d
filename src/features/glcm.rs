use ndarray::{Array2, ArrayView2};

/// Texture statistics from a gray-level co-occurrence matrix built over the
/// full 256 gray levels at distance 1, angle 0 (horizontal neighbor),
/// symmetric and normalized. Returned in fixed order:
/// contrast, energy, homogeneity, correlation.
pub fn glcm_features(img: ArrayView2<u8>) -> [f64; 4] {
    let (height, width) = img.dim();

    let mut counts = Array2::<f64>::zeros((256, 256));
    for r in 0..height {
        for c in 0..width.saturating_sub(1) {
            let i = img[[r, c]] as usize;
            let j = img[[r, c + 1]] as usize;
            counts[[i, j]] += 1.0;
            counts[[j, i]] += 1.0;
        }
    }

    let total = counts.sum();
    if total == 0.0 {
        return [0.0; 4];
    }
    counts /= total;

    // Marginal distribution; identical over rows and columns because the
    // matrix is symmetric.
    let mut marginal = [0.0f64; 256];
    for i in 0..256 {
        for j in 0..256 {
            marginal[i] += counts[[i, j]];
        }
    }
    let mean: f64 = marginal
        .iter()
        .enumerate()
        .map(|(i, p)| i as f64 * p)
        .sum();
    let variance: f64 = marginal
        .iter()
        .enumerate()
        .map(|(i, p)| p * (i as f64 - mean).powi(2))
        .sum();
    let std_dev = variance.sqrt();

    let mut contrast = 0.0;
    let mut asm = 0.0;
    let mut homogeneity = 0.0;
    let mut covariance = 0.0;
    for i in 0..256 {
        for j in 0..256 {
            let p = counts[[i, j]];
            if p == 0.0 {
                continue;
            }
            let diff = i as f64 - j as f64;
            contrast += p * diff * diff;
            asm += p * p;
            homogeneity += p / (1.0 + diff * diff);
            covariance += p * (i as f64 - mean) * (j as f64 - mean);
        }
    }

    let correlation = if std_dev < 1e-15 {
        // A flat image has zero variance; pairs are perfectly correlated.
        1.0
    } else {
        covariance / (std_dev * std_dev)
    };

    [contrast, asm.sqrt(), homogeneity, correlation]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_constant_image_statistics() {
        let img = Array2::from_elem((32, 32), 77u8);

        let [contrast, energy, homogeneity, correlation] = glcm_features(img.view());

        assert_eq!(contrast, 0.0);
        assert!((energy - 1.0).abs() < 1e-12);
        assert!((homogeneity - 1.0).abs() < 1e-12);
        assert_eq!(correlation, 1.0);
    }

    #[test]
    fn test_statistics_stay_in_expected_ranges() {
        let img = Array2::from_shape_fn((64, 64), |(r, c)| (((r + c) % 2) * 255) as u8);

        let [contrast, energy, homogeneity, correlation] = glcm_features(img.view());

        assert!(contrast >= 0.0);
        assert!((0.0..=1.0).contains(&energy));
        assert!((0.0..=1.0).contains(&homogeneity));
        assert!((-1.0..=1.0).contains(&correlation));
    }

    #[test]
    fn test_checkerboard_has_maximal_contrast() {
        // Every horizontal pair is (0, 255) or (255, 0).
        let img = Array2::from_shape_fn((16, 16), |(r, c)| (((r + c) % 2) * 255) as u8);

        let [contrast, _, homogeneity, correlation] = glcm_features(img.view());

        assert!((contrast - 255.0 * 255.0).abs() < 1e-9);
        assert!(homogeneity < 0.01);
        assert!((correlation - (-1.0)).abs() < 1e-9);
    }
}
