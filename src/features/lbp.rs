use ndarray::ArrayView2;
use std::f64::consts::PI;

/// Density-normalized histogram of uniform local binary patterns.
///
/// Each pixel is compared against `points` neighbors sampled with bilinear
/// interpolation on a circle of the given radius. Patterns with at most two
/// circular 0/1 transitions map to their number of set bits, everything else
/// shares the non-uniform bin, giving `points + 2` bins in total.
pub fn lbp_histogram(img: ArrayView2<u8>, points: usize, radius: f64) -> Vec<f64> {
    let (height, width) = img.dim();
    let bins = points + 2;
    let mut histogram = vec![0.0f64; bins];
    if height == 0 || width == 0 {
        return histogram;
    }

    let offsets: Vec<(f64, f64)> = (0..points)
        .map(|p| {
            let angle = 2.0 * PI * p as f64 / points as f64;
            (-radius * angle.sin(), radius * angle.cos())
        })
        .collect();

    let mut bits = vec![false; points];
    for r in 0..height {
        for c in 0..width {
            let center = img[[r, c]] as f64;
            for (p, (dr, dc)) in offsets.iter().enumerate() {
                let sample = bilinear(&img, r as f64 + dr, c as f64 + dc);
                bits[p] = sample >= center;
            }

            let transitions = (0..points)
                .filter(|&p| bits[p] != bits[(p + 1) % points])
                .count();
            let pattern = if transitions <= 2 {
                bits.iter().filter(|&&b| b).count()
            } else {
                points + 1
            };
            histogram[pattern] += 1.0;
        }
    }

    let total = (height * width) as f64;
    for bin in &mut histogram {
        *bin /= total;
    }
    histogram
}

// Bilinear sample; coordinates outside the image read as zero.
fn bilinear(img: &ArrayView2<u8>, r: f64, c: f64) -> f64 {
    let (height, width) = img.dim();
    let r0 = r.floor();
    let c0 = c.floor();
    let dr = r - r0;
    let dc = c - c0;

    let mut value = 0.0;
    for (row, row_weight) in [(r0, 1.0 - dr), (r0 + 1.0, dr)] {
        for (col, col_weight) in [(c0, 1.0 - dc), (c0 + 1.0, dc)] {
            let weight = row_weight * col_weight;
            if weight == 0.0 || row < 0.0 || col < 0.0 {
                continue;
            }
            let (row, col) = (row as usize, col as usize);
            if row < height && col < width {
                value += weight * img[[row, col]] as f64;
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_histogram_is_density_normalized() {
        let img = Array2::from_shape_fn((64, 64), |(r, c)| ((r * 7 + c * 13) % 256) as u8);

        let histogram = lbp_histogram(img.view(), 24, 3.0);

        assert_eq!(histogram.len(), 26);
        let sum: f64 = histogram.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(histogram.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_constant_image_is_fully_uniform() {
        // All neighbors equal the center, so every pixel produces the
        // all-ones pattern.
        let img = Array2::from_elem((32, 32), 99u8);

        let histogram = lbp_histogram(img.view(), 24, 3.0);

        let interior = histogram[24];
        assert!(interior > 0.0);
        assert_eq!(histogram[25], 0.0);
    }

    #[test]
    fn test_bilinear_interpolates_between_pixels() {
        let mut img = Array2::<u8>::zeros((2, 2));
        img[[0, 0]] = 0;
        img[[0, 1]] = 100;
        img[[1, 0]] = 100;
        img[[1, 1]] = 200;

        let view = img.view();
        assert!((bilinear(&view, 0.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((bilinear(&view, 0.5, 0.5) - 100.0).abs() < 1e-9);
        assert!((bilinear(&view, 0.0, 0.5) - 50.0).abs() < 1e-9);
    }
}
