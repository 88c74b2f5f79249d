use ndarray::{Array2, Array3, ArrayView2};

const NORMALIZE_EPS: f64 = 1e-5;
const HYS_CLIP: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
pub struct HogParams {
    pub orientations: usize,
    pub cell_size: usize,
    pub block_size: usize,
}

impl Default for HogParams {
    fn default() -> Self {
        Self {
            orientations: 9,
            cell_size: 16,
            block_size: 2,
        }
    }
}

impl HogParams {
    /// Descriptor length for an image of the given dimensions.
    pub fn descriptor_len(&self, height: usize, width: usize) -> usize {
        let cells_r = height / self.cell_size;
        let cells_c = width / self.cell_size;
        if cells_r < self.block_size || cells_c < self.block_size {
            return 0;
        }
        let blocks_r = cells_r - self.block_size + 1;
        let blocks_c = cells_c - self.block_size + 1;
        blocks_r * blocks_c * self.block_size * self.block_size * self.orientations
    }
}

/// Histogram-of-oriented-gradients descriptor with square-root intensity
/// transform and L2-Hys block normalization. Orientations are unsigned
/// (folded into 180 degrees); gradients are central differences with zero
/// borders; cell magnitudes are averaged over the cell area.
pub fn hog_descriptor(img: ArrayView2<u8>, params: &HogParams) -> Vec<f64> {
    let (height, width) = img.dim();
    let cells_r = height / params.cell_size;
    let cells_c = width / params.cell_size;
    if cells_r < params.block_size || cells_c < params.block_size {
        return Vec::new();
    }

    let normalized = img.mapv(|v| (v as f64 / 255.0).sqrt());
    let (g_row, g_col) = channel_gradients(&normalized);

    let bin_width = 180.0 / params.orientations as f64;
    let mut cell_histograms =
        Array3::<f64>::zeros((cells_r, cells_c, params.orientations));
    for r in 0..cells_r * params.cell_size {
        for c in 0..cells_c * params.cell_size {
            let gr = g_row[[r, c]];
            let gc = g_col[[r, c]];
            let magnitude = (gr * gr + gc * gc).sqrt();
            if magnitude == 0.0 {
                continue;
            }
            let orientation = gr.atan2(gc).to_degrees().rem_euclid(180.0);
            let bin = ((orientation / bin_width) as usize).min(params.orientations - 1);
            cell_histograms[[r / params.cell_size, c / params.cell_size, bin]] += magnitude;
        }
    }
    let cell_area = (params.cell_size * params.cell_size) as f64;
    cell_histograms /= cell_area;

    let blocks_r = cells_r - params.block_size + 1;
    let blocks_c = cells_c - params.block_size + 1;
    let block_len = params.block_size * params.block_size * params.orientations;
    let mut descriptor = Vec::with_capacity(blocks_r * blocks_c * block_len);
    let mut block = Vec::with_capacity(block_len);
    for br in 0..blocks_r {
        for bc in 0..blocks_c {
            block.clear();
            for cr in br..br + params.block_size {
                for cc in bc..bc + params.block_size {
                    for o in 0..params.orientations {
                        block.push(cell_histograms[[cr, cc, o]]);
                    }
                }
            }
            normalize_l2_hys(&mut block);
            descriptor.extend_from_slice(&block);
        }
    }
    descriptor
}

// Central differences, zero at the first and last row/column.
fn channel_gradients(img: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let (height, width) = img.dim();
    let mut g_row = Array2::<f64>::zeros((height, width));
    let mut g_col = Array2::<f64>::zeros((height, width));
    for r in 1..height.saturating_sub(1) {
        for c in 0..width {
            g_row[[r, c]] = img[[r + 1, c]] - img[[r - 1, c]];
        }
    }
    for c in 1..width.saturating_sub(1) {
        for r in 0..height {
            g_col[[r, c]] = img[[r, c + 1]] - img[[r, c - 1]];
        }
    }
    (g_row, g_col)
}

fn normalize_l2_hys(block: &mut [f64]) {
    let norm = (block.iter().map(|v| v * v).sum::<f64>() + NORMALIZE_EPS * NORMALIZE_EPS).sqrt();
    for v in block.iter_mut() {
        *v = (*v / norm).min(HYS_CLIP);
    }
    let norm = (block.iter().map(|v| v * v).sum::<f64>() + NORMALIZE_EPS * NORMALIZE_EPS).sqrt();
    for v in block.iter_mut() {
        *v /= norm;
    }
}
